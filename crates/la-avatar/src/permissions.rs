//! Permission gate for avatar mutations. Checked before anything changes.

use la_core::config::AvatarSettings;
use la_core::{Error, Result, UserId};

use crate::directory::{Directory, Person};

/// A guarded operation and the user it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Read the stored avatar state. Gated like an edit.
    ViewAvatar(UserId),
    UploadAvatar(UserId),
    AssignMedia(UserId),
    DeleteAvatar(UserId),
    SetRating(UserId),
    DeleteAccount(UserId),
    UploadMedia,
    DeleteMedia { owner: Option<UserId> },
    UpdateSettings,
}

/// Reject `actor` if it may not perform `mutation` under `settings`.
pub fn authorize(
    directory: &dyn Directory,
    actor: &Person,
    mutation: Mutation,
    settings: &AvatarSettings,
) -> Result<()> {
    let allowed = match mutation {
        Mutation::UploadAvatar(target) => {
            directory.can_edit(actor, target)
                && (!settings.restrict_uploads || directory.can_upload(actor))
        }
        Mutation::AssignMedia(target) => {
            directory.can_edit(actor, target) && directory.can_upload(actor)
        }
        Mutation::ViewAvatar(target)
        | Mutation::DeleteAvatar(target)
        | Mutation::SetRating(target) => {
            directory.can_edit(actor, target)
        }
        Mutation::UploadMedia => directory.can_upload(actor),
        Mutation::DeleteMedia { owner } => {
            directory.is_admin(actor)
                || (directory.can_upload(actor) && owner == Some(actor.id))
        }
        Mutation::DeleteAccount(_) | Mutation::UpdateSettings => directory.is_admin(actor),
    };

    if allowed {
        Ok(())
    } else {
        tracing::debug!(actor = %actor.id, ?mutation, "Permission denied");
        Err(Error::forbidden(describe(mutation)))
    }
}

fn describe(mutation: Mutation) -> &'static str {
    match mutation {
        Mutation::ViewAvatar(_) => "you cannot view this user's avatar settings",
        Mutation::UploadAvatar(_) => "you cannot upload an avatar for this user",
        Mutation::AssignMedia(_) => "you cannot assign media to this user",
        Mutation::DeleteAvatar(_) => "you cannot remove this user's avatar",
        Mutation::SetRating(_) => "you cannot rate this user's avatar",
        Mutation::DeleteAccount(_) => "only administrators can delete accounts",
        Mutation::UploadMedia => "you cannot upload files",
        Mutation::DeleteMedia { .. } => "you cannot delete this media",
        Mutation::UpdateSettings => "only administrators can change avatar settings",
    }
}
