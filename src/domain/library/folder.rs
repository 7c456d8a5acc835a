//! Conversation folders.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{FolderId, Timestamp, UserId, ValidationError};

/// Maximum folder name length, in characters.
pub const MAX_FOLDER_NAME_LEN: usize = 100;

/// A user-owned folder for grouping conversations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub user_id: UserId,
    pub name: String,
    pub created_at: Timestamp,
}

impl Folder {
    /// Creates a new folder.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty or over-long name.
    pub fn new(user_id: UserId, name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        Self::validate_name(&name)?;
        Ok(Self {
            id: FolderId::new(),
            user_id,
            name,
            created_at: Timestamp::now(),
        })
    }

    /// Renames the folder.
    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        let name = name.into();
        Self::validate_name(&name)?;
        self.name = name;
        Ok(())
    }

    fn validate_name(name: &str) -> Result<(), ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if name.chars().count() > MAX_FOLDER_NAME_LEN {
            return Err(ValidationError::too_long("name", MAX_FOLDER_NAME_LEN));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[test]
    fn creates_valid_folder() {
        let folder = Folder::new(owner(), "Work").unwrap();
        assert_eq!(folder.name, "Work");
    }

    #[test]
    fn rejects_empty_and_over_long_names() {
        assert!(Folder::new(owner(), "").is_err());
        assert!(Folder::new(owner(), "x".repeat(MAX_FOLDER_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn rename_validates() {
        let mut folder = Folder::new(owner(), "Work").unwrap();
        assert!(folder.rename("   ").is_err());
        folder.rename("Personal").unwrap();
        assert_eq!(folder.name, "Personal");
    }
}
