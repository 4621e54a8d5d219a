//! Fixed payloads served when the backend is unreachable.
//! Same shape as the live responses; paging and status filters are honoured.

use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::backend::ListQuery;

const JOB_APPROVALS: &[(&str, &str, &str, &str)] = &[
    ("Senior Backend Engineer", "Engineering", "Priya Nair", "pending"),
    ("Product Designer", "Design", "Tom Becker", "approved"),
    ("Data Analyst", "Finance", "Lena Ortiz", "pending"),
    ("HR Business Partner", "People", "Sam Okafor", "rejected"),
    ("QA Engineer", "Engineering", "Priya Nair", "approved"),
];

const EMPLOYEES: &[(&str, &str, &str, &str)] = &[
    ("Priya Nair", "priya.nair@example.com", "Engineering", "Engineering Manager"),
    ("Tom Becker", "tom.becker@example.com", "Design", "Design Lead"),
    ("Lena Ortiz", "lena.ortiz@example.com", "Finance", "Controller"),
    ("Sam Okafor", "sam.okafor@example.com", "People", "HR Director"),
    ("Mia Chen", "mia.chen@example.com", "Engineering", "Software Engineer"),
    ("Jonas Weber", "jonas.weber@example.com", "Sales", "Account Executive"),
];

fn paginate(items: Vec<Value>, query: &ListQuery) -> (Vec<Value>, Value) {
    let page = query.page();
    let page_size = query.page_size();
    let total = items.len() as u32;
    let start = (page as usize - 1).saturating_mul(page_size as usize);
    let items = items
        .into_iter()
        .skip(start)
        .take(page_size as usize)
        .collect();
    let pagination = json!({
        "page": page,
        "pageSize": page_size,
        "total": total,
        "totalPages": total.div_ceil(page_size),
    });
    (items, pagination)
}

pub fn job_approvals(query: &ListQuery) -> Value {
    let status = query.status.as_deref().filter(|s| !s.is_empty() && *s != "all");
    let approvals: Vec<Value> = JOB_APPROVALS
        .iter()
        .enumerate()
        .filter(|(_, (_, _, _, s))| status.map_or(true, |wanted| wanted.eq_ignore_ascii_case(s)))
        .map(|(i, (title, department, requested_by, s))| {
            json!({
                "id": format!("approval-{}", i + 1),
                "jobTitle": title,
                "department": department,
                "requestedBy": requested_by,
                "status": s,
            })
        })
        .collect();
    let (approvals, pagination) = paginate(approvals, query);
    json!({ "approvals": approvals, "pagination": pagination })
}

/// Echoes the submitted approval request back as a pending approval.
pub fn submitted_job_approval(body: &Value) -> Value {
    let mut approval = body.clone();
    if let Some(obj) = approval.as_object_mut() {
        obj.insert("id".to_string(), json!(Uuid::new_v4()));
        obj.insert("status".to_string(), json!("pending"));
        obj.insert("createdAt".to_string(), json!(Utc::now()));
    }
    json!({ "approval": approval })
}

pub fn employees(query: &ListQuery) -> Value {
    let needle = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    let employees: Vec<Value> = EMPLOYEES
        .iter()
        .enumerate()
        .filter(|(_, (name, email, department, _))| {
            needle.as_deref().map_or(true, |n| {
                name.to_lowercase().contains(n)
                    || email.contains(n)
                    || department.to_lowercase().contains(n)
            })
        })
        .map(|(i, (name, email, department, position))| {
            json!({
                "id": i + 1,
                "name": name,
                "email": email,
                "department": department,
                "position": position,
            })
        })
        .collect();
    let (employees, pagination) = paginate(employees, query);
    json!({ "employees": employees, "pagination": pagination })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_approvals_filter_by_status() {
        let query = ListQuery {
            status: Some("Pending".to_string()),
            ..Default::default()
        };
        let payload = job_approvals(&query);
        let approvals = payload["approvals"].as_array().unwrap();
        assert_eq!(approvals.len(), 2);
        assert!(approvals.iter().all(|a| a["status"] == "pending"));
        assert_eq!(payload["pagination"]["total"], 2);
    }

    #[test]
    fn test_job_approvals_all_status() {
        let query = ListQuery {
            status: Some("all".to_string()),
            ..Default::default()
        };
        assert_eq!(job_approvals(&query)["pagination"]["total"], 5);
    }

    #[test]
    fn test_employees_paging() {
        let query = ListQuery {
            page: Some(2),
            page_size: Some(4),
            ..Default::default()
        };
        let payload = employees(&query);
        assert_eq!(payload["employees"].as_array().unwrap().len(), 2);
        assert_eq!(payload["pagination"]["totalPages"], 2);
        assert_eq!(payload["pagination"]["pageSize"], 4);
    }

    #[test]
    fn test_employees_search() {
        let query = ListQuery {
            search: Some("engineering".to_string()),
            ..Default::default()
        };
        assert_eq!(employees(&query)["pagination"]["total"], 2);
    }

    #[test]
    fn test_submitted_approval_is_pending() {
        let payload = submitted_job_approval(&json!({"jobTitle": "SRE"}));
        assert_eq!(payload["approval"]["jobTitle"], "SRE");
        assert_eq!(payload["approval"]["status"], "pending");
        assert!(payload["approval"]["id"].is_string());
    }

    #[test]
    fn test_largest_page_number_is_empty() {
        let query = ListQuery {
            page: Some(u32::MAX),
            page_size: Some(100),
            ..Default::default()
        };
        assert!(job_approvals(&query)["approvals"].as_array().unwrap().is_empty());
        let payload = employees(&query);
        assert!(payload["employees"].as_array().unwrap().is_empty());
        assert_eq!(payload["pagination"]["page"], u32::MAX);
    }
}
