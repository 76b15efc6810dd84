use serde::{Deserialize, Serialize};

use crate::UserId;

// ============================================================================
// Create User
// ============================================================================

/// Body of `POST /create`. A client-supplied `id` is ignored; the store
/// assigns one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUserParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub friends: Vec<UserId>,
}

// ============================================================================
// Make Friends
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeFriendsParams {
    pub source_id: UserId,
    pub target_id: UserId,
}

// ============================================================================
// Delete User
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserParams {
    pub target_id: UserId,
}

// ============================================================================
// Update Age
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAgeParams {
    pub new_age: String,
}

// ============================================================================
// Stats
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResult {
    pub pid: u32,
    pub users: usize,
    pub friendships: usize,
    pub next_id: u64,
}
