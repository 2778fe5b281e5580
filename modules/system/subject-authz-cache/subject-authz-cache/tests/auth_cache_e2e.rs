#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end tests: watch events flow through the queue and worker into the
//! stores, and back out through the read API.

use std::sync::Arc;
use std::time::Duration;

use static_accessor_plugin::Service as StaticAccessor;
use subject_authz_cache::domain::{resolve_accounts, resolve_namespaces};
use subject_authz_cache::infra::memory::{InMemoryObjectClient, InMemoryWatchSource};
use subject_authz_cache::{SubjectAuthzCacheConfig, SubjectAuthzCacheModule};
use subject_authz_cache_sdk::{
    Account, Namespace, RoleBinding, RoleRef, Subject, SubjectAccessError, SubjectKey,
    UserPrincipal, Verb,
};

async fn eventually(what: &str, mut cond: impl FnMut() -> bool) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for: {what}");
}

fn names(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| (*s).to_owned()).collect()
}

fn role_binding(namespace: &str, subjects: Vec<Subject>) -> RoleBinding {
    RoleBinding {
        name: "access".to_owned(),
        namespace: Some(namespace.to_owned()),
        role_ref: RoleRef {
            kind: "ClusterRole".to_owned(),
            name: "edit".to_owned(),
        },
        subjects,
    }
}

fn start(accessor: &Arc<StaticAccessor>, watch: &InMemoryWatchSource) -> SubjectAuthzCacheModule {
    SubjectAuthzCacheModule::start(
        Arc::clone(accessor) as _,
        watch,
        SubjectAuthzCacheConfig::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn watch_events_populate_cache_for_every_verb() {
    let accessor = Arc::new(StaticAccessor::new());
    let watch = InMemoryWatchSource::new();
    let module = start(&accessor, &watch);
    let cache = Arc::clone(module.cache());

    assert_eq!(cache.pending(), 0);
    assert!(cache.namespace_store().is_empty());
    assert!(cache.account_store().is_empty());

    accessor.set_namespaces(SubjectKey::user("foo"), names(&["test", "test2"]));
    watch.add_role_binding(&role_binding("test", vec![Subject::user("foo")]));
    eventually("namespaces for user:foo", || {
        cache.namespace_store().get("user:foo").is_some()
    })
    .await;

    accessor.set_accounts(SubjectKey::group("bar"), names(&["foo", "bar"]));
    watch.add_account(&Account {
        subjects: vec![Subject::group("bar")],
        ..Account::new("foo")
    });
    eventually("accounts for group:bar", || {
        cache.account_store().get("group:bar").is_some()
    })
    .await;

    let client = module.client();
    let user = UserPrincipal::builder().name("foo").group("bar").build();
    for verb in Verb::ALL {
        assert_eq!(
            client.get_accounts_for_user(&user, verb.as_str()).unwrap(),
            names(&["foo", "bar"])
        );
        assert_eq!(
            client.get_namespaces_for_user(&user, verb.as_str()).unwrap(),
            names(&["test", "test2"])
        );
    }

    assert_eq!(
        client.get_accounts_for_user(&user, "bad"),
        Err(SubjectAccessError::UnsupportedVerb {
            verb: "bad".to_owned()
        })
    );
    assert!(client.get_namespaces_for_user(&user, "bad").is_err());

    module.stop().await.unwrap();
}

#[tokio::test]
async fn revocation_empties_stored_entry() {
    let accessor = Arc::new(StaticAccessor::new());
    let watch = InMemoryWatchSource::new();
    let module = start(&accessor, &watch);
    let cache = Arc::clone(module.cache());
    let binding = role_binding("test", vec![Subject::user("foo")]);

    accessor.set_namespaces(SubjectKey::user("foo"), names(&["test", "test2"]));
    watch.add_role_binding(&binding);
    eventually("grant visible", || {
        cache
            .namespace_store()
            .get("user:foo")
            .is_some_and(|n| n.len() == 2)
    })
    .await;

    accessor.revoke(&SubjectKey::user("foo"));
    watch.delete_role_binding(&binding);
    eventually("revocation visible", || {
        cache
            .namespace_store()
            .get("user:foo")
            .is_some_and(|n| n.is_empty())
    })
    .await;

    let user = UserPrincipal::builder().name("foo").build();
    assert!(cache.get_namespaces_for_user(&user, "list").unwrap().is_empty());

    module.stop().await.unwrap();
}

#[tokio::test]
async fn subject_dropped_by_update_loses_access() {
    let accessor = Arc::new(StaticAccessor::new());
    let watch = InMemoryWatchSource::new();
    let module = start(&accessor, &watch);
    let cache = Arc::clone(module.cache());

    let old = role_binding("test", vec![Subject::user("alice"), Subject::user("bob")]);
    accessor.set_namespaces(SubjectKey::user("alice"), names(&["test"]));
    accessor.set_namespaces(SubjectKey::user("bob"), names(&["test"]));
    watch.add_role_binding(&old);
    eventually("both users granted", || {
        cache.namespace_store().get("user:alice").is_some()
            && cache.namespace_store().get("user:bob").is_some()
    })
    .await;

    let new = role_binding("test", vec![Subject::user("alice")]);
    accessor.revoke(&SubjectKey::user("bob"));
    watch.update_role_binding(&old, &new);
    eventually("bob revoked", || {
        cache
            .namespace_store()
            .get("user:bob")
            .is_some_and(|n| n.is_empty())
    })
    .await;

    assert_eq!(
        &*cache.namespace_store().get("user:alice").unwrap(),
        names(&["test"]).as_slice()
    );

    module.stop().await.unwrap();
}

#[tokio::test]
async fn cluster_binding_and_service_account_subjects() {
    let accessor = Arc::new(StaticAccessor::new());
    let watch = InMemoryWatchSource::new();
    let module = start(&accessor, &watch);
    let cache = Arc::clone(module.cache());

    let sa_key = SubjectKey::service_account("ci", "deployer");
    accessor.set_namespaces(sa_key.clone(), names(&["staging"]));
    watch.add_role_binding(&RoleBinding {
        name: "deployers".to_owned(),
        namespace: None,
        subjects: vec![Subject::service_account("ci", "deployer")],
        ..RoleBinding::default()
    });
    eventually("service account granted", || {
        cache.namespace_store().get(sa_key.as_str()).is_some()
    })
    .await;

    let principal = UserPrincipal::builder()
        .name("system:serviceaccount:ci:deployer")
        .build();
    assert_eq!(
        cache.get_namespaces_for_user(&principal, "create").unwrap(),
        names(&["staging"])
    );

    module.stop().await.unwrap();
}

#[tokio::test]
async fn start_rejects_invalid_config() {
    let accessor = Arc::new(StaticAccessor::new());
    let watch = InMemoryWatchSource::new();
    let config = SubjectAuthzCacheConfig {
        workers: 0,
        ..SubjectAuthzCacheConfig::default()
    };

    assert!(SubjectAuthzCacheModule::start(accessor as _, &watch, config).is_err());
}

#[test]
fn start_outside_runtime_is_an_error() {
    let accessor = Arc::new(StaticAccessor::new());
    let watch = InMemoryWatchSource::new();

    let err = SubjectAuthzCacheModule::start(
        accessor as _,
        &watch,
        SubjectAuthzCacheConfig::default(),
    )
    .err()
    .unwrap();
    assert!(err.to_string().contains("tokio runtime"));
}

#[tokio::test]
async fn retrieval_helpers_resolve_cached_names() {
    let namespaces = InMemoryObjectClient::with_objects([Namespace::new("test")]);
    let accounts = InMemoryObjectClient::<Account>::new();

    let got = resolve_namespaces(&namespaces, &names(&["test", "test2"]))
        .await
        .unwrap();
    assert_eq!(got, vec![Namespace::new("test")]);

    let got = resolve_namespaces(&namespaces, &names(&["*"])).await.unwrap();
    assert_eq!(got, vec![Namespace::new("test")]);

    assert!(resolve_accounts(&accounts, &names(&["*"])).await.unwrap().is_empty());
}
