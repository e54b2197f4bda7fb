//! Policy Administration Point: the port through which the pipeline fetches
//! the stored policies applicable to a (subject, action) pair (spec §3).

use crate::entities::AuthPolicy;
use crate::error::PdpError;
use crate::value_objects::Pk;
use async_trait::async_trait;

/// Supplies the authorization policies attached to any of a set of subject
/// PKs for a given action. Implementations own whatever storage and
/// effective-dating logic the deployment uses; the pipeline filters expired
/// policies itself (spec §4.4) so a PAP implementation may over-return.
#[async_trait]
pub trait PapProvider: Send + Sync {
    async fn get_policies(&self, subject_pks: &[Pk], action_pk: Pk) -> Result<Vec<AuthPolicy>, PdpError>;
}
