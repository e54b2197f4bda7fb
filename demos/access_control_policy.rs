//! Document access control example
//!
//! This example demonstrates:
//! - Building a request against an in-memory PIP/PAP fixture
//! - Evaluating an allow decision (`Entrance::eval`)
//! - Querying a residual expression for a partially known context
//!   (`Entrance::query`)

use pdp_core::config::PdpConfig;
use pdp_core::entities::{Action, ActionDetail, AuthPolicy, Request, ResourceRef, Subject, SubjectDetail};
use pdp_core::entrance::Entrance;
use pdp_core::infrastructure::fixture::{ActionFixture, Fixture, PolicyFixture, SubjectFixture};
use pdp_core::infrastructure::{FixturePap, FixturePip};
use pdp_core::value_objects::PolicyId;
use std::collections::HashMap;

fn document_access_expression() -> String {
    // Allow if the document is public, or if it's internal/confidential and
    // the requesting subject's department matches the document's department.
    serde_json::json!([{
        "system": "docs",
        "type": "file",
        "expression": {
            "op": "OR",
            "content": [
                {"op": "StringEquals", "field": "docs.file.classification", "value": "public"},
                {"op": "AND", "content": [
                    {"op": "In", "field": "docs.file.classification", "value": ["internal", "confidential"]},
                    {"op": "StringEquals", "field": "docs.file.department", "value": "engineering"}
                ]}
            ]
        }
    }])
    .to_string()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== pdp-core document access example ===\n");

    let fixture = Fixture {
        subjects: vec![SubjectFixture {
            r#type: "user".to_string(),
            id: "alice".to_string(),
            detail: SubjectDetail {
                pk: 1,
                department_pks: vec![],
                groups: vec![],
            },
        }],
        actions: vec![ActionFixture {
            id: "doc.read".to_string(),
            detail: ActionDetail {
                pk: 100,
                resource_types: vec![("docs".to_string(), "file".to_string())],
            },
        }],
        resource_attrs: vec![],
        policies: vec![PolicyFixture {
            subject_pks: vec![1],
            action_pk: 100,
            policy: AuthPolicy {
                id: PolicyId(1),
                version: 1,
                expression: document_access_expression(),
                expression_signature: "v1".to_string(),
                expired_at: i64::MAX,
            },
        }],
    };

    let entrance = Entrance::new(FixturePip::from(&fixture), FixturePap::from(&fixture), PdpConfig::default());

    println!("1. Public document, should be allowed.");
    let mut public_request = Request {
        system: "bk_cmdb".to_string(),
        subject: Subject { r#type: "user".to_string(), id: "alice".to_string() },
        action: Action { id: "doc.read".to_string() },
        resources: vec![ResourceRef::new("docs", "file", "readme")
            .with_attr("classification", "public")
            .with_attr("department", "sales")],
        environment: HashMap::new(),
        deadline_ms: None,
    };
    let allowed = entrance.eval(&mut public_request, false).await?;
    println!("   allow = {allowed}\n");

    println!("2. Confidential document outside the subject's department, should be denied.");
    let mut confidential_request = Request {
        system: "bk_cmdb".to_string(),
        subject: Subject { r#type: "user".to_string(), id: "alice".to_string() },
        action: Action { id: "doc.read".to_string() },
        resources: vec![ResourceRef::new("docs", "file", "roadmap")
            .with_attr("classification", "confidential")
            .with_attr("department", "sales")],
        environment: HashMap::new(),
        deadline_ms: None,
    };
    let allowed = entrance.eval(&mut confidential_request, false).await?;
    println!("   allow = {allowed}\n");

    println!("3. Query for the residual expression over an only partially known document.");
    let mut query_request = Request {
        system: "bk_cmdb".to_string(),
        subject: Subject { r#type: "user".to_string(), id: "alice".to_string() },
        action: Action { id: "doc.read".to_string() },
        resources: vec![ResourceRef::new("docs", "file", "unknown")],
        environment: HashMap::new(),
        deadline_ms: None,
    };
    let residual = entrance.query(&mut query_request, false, false).await?;
    println!("   residual = {residual}");

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
