//! End-to-end scenarios for the decision pipeline, each driving
//! `Entrance::eval`/`Entrance::query` against an in-memory fixture exactly as
//! `pdp-eval` does, rather than poking the condition algebra directly.

use pdp_core::config::PdpConfig;
use pdp_core::entities::{Action, ActionDetail, AuthPolicy, GroupMembership, Request, ResourceRef, Subject, SubjectDetail};
use pdp_core::entrance::Entrance;
use pdp_core::infrastructure::fixture::{ActionFixture, Fixture, PolicyFixture, SubjectFixture};
use pdp_core::infrastructure::{FixturePap, FixturePip};
use pdp_core::value_objects::PolicyId;
use std::collections::HashMap;

fn one_resource_type_fixture(expression: &str) -> Fixture {
    Fixture {
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
            id: "host.view".to_string(),
            detail: ActionDetail {
                pk: 100,
                resource_types: vec![("bk_cmdb".to_string(), "host".to_string())],
            },
        }],
        resource_attrs: vec![],
        policies: vec![PolicyFixture {
            subject_pks: vec![1],
            action_pk: 100,
            policy: AuthPolicy {
                id: PolicyId(1),
                version: 1,
                expression: expression.to_string(),
                expression_signature: "sig".to_string(),
                expired_at: i64::MAX,
            },
        }],
    }
}

fn request(resource: ResourceRef) -> Request {
    Request {
        system: "bk_cmdb".to_string(),
        subject: Subject { r#type: "user".to_string(), id: "alice".to_string() },
        action: Action { id: "host.view".to_string() },
        resources: vec![resource],
        environment: HashMap::new(),
        deadline_ms: None,
    }
}

fn fragment(expression_body: &str) -> String {
    format!(r#"[{{"system":"bk_cmdb","type":"host","expression":{expression_body}}}]"#)
}

#[tokio::test]
async fn simple_allow_on_matching_attribute() {
    let fixture = one_resource_type_fixture(&fragment(
        r#"{"op":"StringEquals","field":"bk_cmdb.host.env","value":"prod"}"#,
    ));
    let entrance = Entrance::new(FixturePip::from(&fixture), FixturePap::from(&fixture), PdpConfig::default());

    let mut req = request(ResourceRef::new("bk_cmdb", "host", "1").with_attr("env", "prod"));
    assert!(entrance.eval(&mut req, false).await.unwrap());

    let mut denied = request(ResourceRef::new("bk_cmdb", "host", "2").with_attr("env", "stage"));
    assert!(!entrance.eval(&mut denied, false).await.unwrap());
}

#[tokio::test]
async fn list_attribute_any_of_matches_existentially() {
    let fixture = one_resource_type_fixture(&fragment(
        r#"{"op":"In","field":"bk_cmdb.host.tags","value":["critical","edge"]}"#,
    ));
    let entrance = Entrance::new(FixturePip::from(&fixture), FixturePap::from(&fixture), PdpConfig::default());

    let mut req = request(
        ResourceRef::new("bk_cmdb", "host", "1").with_attr("tags", vec!["staging", "edge"]),
    );
    assert!(entrance.eval(&mut req, false).await.unwrap());

    let mut req_no_match = request(
        ResourceRef::new("bk_cmdb", "host", "2").with_attr("tags", vec!["staging", "internal"]),
    );
    assert!(!entrance.eval(&mut req_no_match, false).await.unwrap());
}

#[tokio::test]
async fn negation_on_absent_key_is_closed_world_false() {
    let fixture = one_resource_type_fixture(&fragment(
        r#"{"op":"!StringEquals","field":"bk_cmdb.host.decommissioned","value":"true"}"#,
    ));
    let entrance = Entrance::new(FixturePip::from(&fixture), FixturePap::from(&fixture), PdpConfig::default());

    // "decommissioned" is never set on this resource; a negated leaf on an
    // absent key must stay false, not vacuously true.
    let mut req = request(ResourceRef::new("bk_cmdb", "host", "1"));
    assert!(!entrance.eval(&mut req, false).await.unwrap());
}

#[tokio::test]
async fn and_or_nesting_allows_prod_or_staged_service_path() {
    let fixture = one_resource_type_fixture(&fragment(
        r#"{
            "op": "AND",
            "content": [
                {"op": "OR", "content": [
                    {"op": "StringEquals", "field": "bk_cmdb.host.env", "value": "prod"},
                    {"op": "StringEquals", "field": "bk_cmdb.host.env", "value": "stage"}
                ]},
                {"op": "StringPrefix", "field": "bk_cmdb.host.path", "value": "/svc/*"}
            ]
        }"#,
    ));
    let entrance = Entrance::new(FixturePip::from(&fixture), FixturePap::from(&fixture), PdpConfig::default());

    let mut allowed = request(
        ResourceRef::new("bk_cmdb", "host", "1")
            .with_attr("env", "stage")
            .with_attr("path", "/svc/api"),
    );
    assert!(entrance.eval(&mut allowed, false).await.unwrap());

    let mut wrong_path = request(
        ResourceRef::new("bk_cmdb", "host", "2")
            .with_attr("env", "stage")
            .with_attr("path", "/other"),
    );
    assert!(!entrance.eval(&mut wrong_path, false).await.unwrap());
}

#[tokio::test]
async fn query_returns_residual_expression_for_partially_known_resource() {
    let fixture = one_resource_type_fixture(&fragment(
        r#"{"op":"AND","content":[
            {"op":"StringEquals","field":"bk_cmdb.host.env","value":"prod"},
            {"op":"StringPrefix","field":"bk_cmdb.host.path","value":"/svc/*"}
        ]}"#,
    ));
    let entrance = Entrance::new(FixturePip::from(&fixture), FixturePap::from(&fixture), PdpConfig::default());

    // Only "env" is known up front; "path" is left for the residual.
    let mut req = request(ResourceRef::new("bk_cmdb", "host", "1").with_attr("env", "prod"));
    let residual = entrance.query(&mut req, false, false).await.unwrap();
    assert_eq!(residual["op"], "starts_with");
    assert_eq!(residual["field"], "bk_cmdb.host.path");
    assert_eq!(residual["value"], "/svc/*");
}

#[tokio::test]
async fn query_with_no_surviving_policy_returns_empty_object() {
    let fixture = one_resource_type_fixture(&fragment(
        r#"{"op":"StringEquals","field":"bk_cmdb.host.env","value":"prod"}"#,
    ));
    let entrance = Entrance::new(FixturePip::from(&fixture), FixturePap::from(&fixture), PdpConfig::default());

    let mut req = request(ResourceRef::new("bk_cmdb", "host", "1").with_attr("env", "stage"));
    let residual = entrance.query(&mut req, false, false).await.unwrap();
    assert_eq!(residual, serde_json::json!({}));
}

#[tokio::test]
async fn no_policies_for_subject_action_is_a_distinguished_error() {
    let fixture = Fixture {
        subjects: vec![SubjectFixture {
            r#type: "user".to_string(),
            id: "bob".to_string(),
            detail: SubjectDetail {
                pk: 2,
                department_pks: vec![],
                groups: vec![],
            },
        }],
        actions: vec![ActionFixture {
            id: "host.view".to_string(),
            detail: ActionDetail {
                pk: 100,
                resource_types: vec![("bk_cmdb".to_string(), "host".to_string())],
            },
        }],
        resource_attrs: vec![],
        policies: vec![],
    };
    let entrance = Entrance::new(FixturePip::from(&fixture), FixturePap::from(&fixture), PdpConfig::default());

    let mut req = Request {
        system: "bk_cmdb".to_string(),
        subject: Subject { r#type: "user".to_string(), id: "bob".to_string() },
        action: Action { id: "host.view".to_string() },
        resources: vec![ResourceRef::new("bk_cmdb", "host", "1")],
        environment: HashMap::new(),
        deadline_ms: None,
    };
    let err = entrance.eval(&mut req, false).await.unwrap_err();
    assert_eq!(err.exit_code(), 0);
}

#[tokio::test]
async fn mismatched_resource_type_is_an_invalid_request() {
    let fixture = one_resource_type_fixture(&fragment(r#"{"op":"Any"}"#));
    let entrance = Entrance::new(FixturePip::from(&fixture), FixturePap::from(&fixture), PdpConfig::default());

    let mut req = Request {
        system: "bk_cmdb".to_string(),
        subject: Subject { r#type: "user".to_string(), id: "alice".to_string() },
        action: Action { id: "host.view".to_string() },
        // The action expects a (bk_cmdb, host) resource, not (docs, file).
        resources: vec![ResourceRef::new("docs", "file", "1")],
        environment: HashMap::new(),
        deadline_ms: None,
    };
    let err = entrance.eval(&mut req, false).await.unwrap_err();
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn subject_groups_with_expired_membership_do_not_grant_access() {
    let fixture = Fixture {
        subjects: vec![SubjectFixture {
            r#type: "user".to_string(),
            id: "carol".to_string(),
            detail: SubjectDetail {
                pk: 3,
                department_pks: vec![],
                groups: vec![GroupMembership { group_pk: 99, policy_expired_at: 1 }],
            },
        }],
        actions: vec![ActionFixture {
            id: "host.view".to_string(),
            detail: ActionDetail {
                pk: 100,
                resource_types: vec![("bk_cmdb".to_string(), "host".to_string())],
            },
        }],
        resource_attrs: vec![],
        // This policy is attached only to the group PK, whose membership
        // already expired, so carol's effective PKs should exclude it.
        policies: vec![PolicyFixture {
            subject_pks: vec![99],
            action_pk: 100,
            policy: AuthPolicy {
                id: PolicyId(1),
                version: 1,
                expression: fragment(r#"{"op":"Any"}"#),
                expression_signature: "sig".to_string(),
                expired_at: i64::MAX,
            },
        }],
    };
    let entrance = Entrance::new(FixturePip::from(&fixture), FixturePap::from(&fixture), PdpConfig::default());

    let mut req = Request {
        system: "bk_cmdb".to_string(),
        subject: Subject { r#type: "user".to_string(), id: "carol".to_string() },
        action: Action { id: "host.view".to_string() },
        resources: vec![ResourceRef::new("bk_cmdb", "host", "1")],
        environment: HashMap::new(),
        deadline_ms: None,
    };
    let err = entrance.eval(&mut req, false).await.unwrap_err();
    assert_eq!(err.exit_code(), 0); // no_policies: carol has no applicable policy
}
