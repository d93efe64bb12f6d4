use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUser {
    pub id: Uuid,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub enabled: bool,
}

/// Basic profile fields written on every sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserBasics {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredGroup {
    pub id: Uuid,
    pub name: String,
    /// `None` for root-level groups
    pub parent_id: Option<Uuid>,
}

impl StoredGroup {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
