//! Resolve requested names, or the `*` wildcard, into live objects.
//!
//! These helpers go straight to the object client; they do not consult the
//! cache.

use subject_authz_cache_sdk::{Account, NamedObject, Namespace, ObjectClient, WILDCARD};

use super::error::DomainError;

/// Resolve namespace names. See [`resolve_objects`].
///
/// # Errors
///
/// - `BackendFailure` for any client error other than not-found
pub async fn resolve_namespaces(
    client: &dyn ObjectClient<Namespace>,
    names: &[String],
) -> Result<Vec<Namespace>, DomainError> {
    resolve_objects(client, names).await
}

/// Resolve account names. See [`resolve_objects`].
///
/// # Errors
///
/// - `BackendFailure` for any client error other than not-found
pub async fn resolve_accounts(
    client: &dyn ObjectClient<Account>,
    names: &[String],
) -> Result<Vec<Account>, DomainError> {
    resolve_objects(client, names).await
}

/// Fetch the requested objects.
///
/// - `["*"]` returns every object of the kind, sorted by name.
/// - Otherwise each name is fetched in request order; missing names are
///   skipped.
///
/// # Errors
///
/// - `BackendFailure` for any client error other than not-found
#[tracing::instrument(skip_all, fields(kind = T::KIND, requested = names.len()))]
pub async fn resolve_objects<T: NamedObject>(
    client: &dyn ObjectClient<T>,
    names: &[String],
) -> Result<Vec<T>, DomainError> {
    if let [only] = names
        && only == WILDCARD
    {
        let mut all = client
            .list()
            .await
            .map_err(|e| DomainError::backend_failure(T::KIND, &e))?;
        all.sort_by(|a, b| a.name().cmp(b.name()));
        return Ok(all);
    }

    let mut out = Vec::with_capacity(names.len());
    for name in names {
        match client.get(name).await {
            Ok(obj) => out.push(obj),
            Err(e) if e.is_not_found() => {
                tracing::debug!(name = %name, "Requested object does not exist, skipping");
            }
            Err(e) => return Err(DomainError::backend_failure(T::KIND, &e)),
        }
    }
    Ok(out)
}
