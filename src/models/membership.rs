use serde::{Deserialize, Serialize};

/// Join row between users and organizations. Existence implies access;
/// there is no surrogate id and rows are physically inserted/removed (as
/// side effects of organization creation and invitation acceptance).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub user_id: String,
    pub organization_id: String,
    pub created_at: i64,
}
