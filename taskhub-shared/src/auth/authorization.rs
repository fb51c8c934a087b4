/// Access-control evaluator
///
/// A pure decision function over the acting identity, the operation, the
/// target resource's ownership edges, and the actor's membership in the
/// target's team (if any). No I/O: callers load the membership row and the
/// *live* user record first — never the role claim embedded in a token —
/// and hand the values in.
///
/// The rules run as an ordered pipeline of guards; the first guard to
/// produce a verdict wins:
///
/// 1. Inactive identities are denied outright.
/// 2. A user deleting their own account is rejected, even an app admin —
///    the acting session must not orphan itself.
/// 3. A live `app_admin` global role allows everything else.
/// 4. The user-administration surface is app-admin only.
/// 5. Creating a brand-new team needs nothing beyond an active identity.
/// 6. Every other team-scoped operation requires a membership in the
///    target's team; task creation inside an existing team included.
/// 7. A comment's author may delete it regardless of membership role.
/// 8. Destructive or role-changing operations (team management, task
///    deletion, deleting someone else's comment) require the `admin`
///    membership role.
/// 9. Whatever remains — read, create, member-level update — is allowed.
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::authorization::{evaluate, Action, Actor, DenyReason, Target};
/// use taskhub_shared::models::membership::MembershipRole;
/// use taskhub_shared::models::user::GlobalRole;
/// use uuid::Uuid;
///
/// let actor = Actor { id: Uuid::new_v4(), global_role: GlobalRole::User, active: true };
///
/// // A plain member may read team content...
/// assert!(evaluate(&actor, Action::Read, Target::Task, Some(MembershipRole::Member)).is_ok());
///
/// // ...but a non-member may not.
/// assert_eq!(
///     evaluate(&actor, Action::Read, Target::Task, None),
///     Err(DenyReason::NotAMember)
/// );
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::membership::MembershipRole;
use crate::models::user::{GlobalRole, User};

/// The acting identity, as loaded live from the credential store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// User ID
    pub id: Uuid,

    /// Live global role — not the token's embedded snapshot
    pub global_role: GlobalRole,

    /// Live active flag
    pub active: bool,
}

impl Actor {
    /// Builds an actor from a live user record
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            global_role: user.global_role,
            active: user.active,
        }
    }
}

/// The operation being attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

/// The target resource, reduced to the ownership edges the rules need
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A brand-new team; the creator needs no prior membership and becomes
    /// the team's membership admin afterwards
    TeamCreation,

    /// An existing team. `Update` covers role-changing management such as
    /// adding members; `Delete` removes the team
    Team,

    /// A task within a team, creation included — membership in the team is
    /// a precondition, creation grants nothing
    Task,

    /// A comment on a task, carrying its author edge
    Comment { author_id: Uuid },

    /// A user record on the admin surface, carrying the target's id so
    /// self-deletion can be refused
    User { target_id: Uuid },
}

/// Why an operation was denied
///
/// Reasons are for server-side logging and tests only; callers of the HTTP
/// API see an undifferentiated 403.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The identity has been deactivated
    #[error("Identity is inactive")]
    Inactive,

    /// No membership in the target's team
    #[error("Not a member of the target team")]
    NotAMember,

    /// The operation requires the `admin` membership role
    #[error("Requires team admin membership")]
    RequiresTeamAdmin,

    /// The operation requires the `app_admin` global role
    #[error("Requires app admin role")]
    RequiresAppAdmin,

    /// Only the content's author (or an admin) may do this
    #[error("Not the owner of this content")]
    NotOwner,

    /// Deleting the acting identity's own account is refused
    #[error("Cannot delete your own account")]
    CannotSelfDelete,
}

/// Outcome of the evaluator: allow, or deny with a reason
pub type Decision = Result<(), DenyReason>;

/// Everything a guard gets to look at
#[derive(Debug, Clone, Copy)]
struct AccessRequest {
    actor: Actor,
    action: Action,
    target: Target,
    membership: Option<MembershipRole>,
}

/// A single guard's verdict: settle the request or pass it on
enum Verdict {
    Allow,
    Deny(DenyReason),
    Continue,
}

type Guard = fn(&AccessRequest) -> Verdict;

/// The ordered guard pipeline; first settled verdict wins
const PIPELINE: &[Guard] = &[
    deny_inactive,
    deny_self_delete,
    allow_app_admin,
    require_app_admin_for_users,
    allow_team_creation,
    require_membership,
    allow_comment_author,
    require_team_admin,
];

/// Decides whether `actor` may perform `action` on `target`
///
/// `membership` is the actor's membership row in the target's team, if
/// any; pass `None` for non-members and for targets without a team.
pub fn evaluate(
    actor: &Actor,
    action: Action,
    target: Target,
    membership: Option<MembershipRole>,
) -> Decision {
    let request = AccessRequest {
        actor: *actor,
        action,
        target,
        membership,
    };

    for guard in PIPELINE {
        match guard(&request) {
            Verdict::Allow => return Ok(()),
            Verdict::Deny(reason) => return Err(reason),
            Verdict::Continue => {}
        }
    }

    // Read/create/member-level update within a membership the pipeline
    // already vouched for.
    Ok(())
}

fn deny_inactive(req: &AccessRequest) -> Verdict {
    if !req.actor.active {
        Verdict::Deny(DenyReason::Inactive)
    } else {
        Verdict::Continue
    }
}

// Checked before the app_admin bypass: the rule binds admins too.
fn deny_self_delete(req: &AccessRequest) -> Verdict {
    match req.target {
        Target::User { target_id }
            if req.action == Action::Delete && target_id == req.actor.id =>
        {
            Verdict::Deny(DenyReason::CannotSelfDelete)
        }
        _ => Verdict::Continue,
    }
}

fn allow_app_admin(req: &AccessRequest) -> Verdict {
    if req.actor.global_role == GlobalRole::AppAdmin {
        Verdict::Allow
    } else {
        Verdict::Continue
    }
}

fn require_app_admin_for_users(req: &AccessRequest) -> Verdict {
    match req.target {
        Target::User { .. } => Verdict::Deny(DenyReason::RequiresAppAdmin),
        _ => Verdict::Continue,
    }
}

fn allow_team_creation(req: &AccessRequest) -> Verdict {
    match req.target {
        Target::TeamCreation => Verdict::Allow,
        _ => Verdict::Continue,
    }
}

fn require_membership(req: &AccessRequest) -> Verdict {
    if req.membership.is_none() {
        Verdict::Deny(DenyReason::NotAMember)
    } else {
        Verdict::Continue
    }
}

fn allow_comment_author(req: &AccessRequest) -> Verdict {
    match req.target {
        Target::Comment { author_id }
            if req.action == Action::Delete && author_id == req.actor.id =>
        {
            Verdict::Allow
        }
        _ => Verdict::Continue,
    }
}

fn require_team_admin(req: &AccessRequest) -> Verdict {
    let is_team_admin = req.membership.map(|m| m.is_admin()).unwrap_or(false);

    match (req.target, req.action) {
        // Team management: adding members, deleting the team
        (Target::Team, Action::Update) | (Target::Team, Action::Delete) => {
            if is_team_admin {
                Verdict::Allow
            } else {
                Verdict::Deny(DenyReason::RequiresTeamAdmin)
            }
        }
        // Task deletion is destructive
        (Target::Task, Action::Delete) => {
            if is_team_admin {
                Verdict::Allow
            } else {
                Verdict::Deny(DenyReason::RequiresTeamAdmin)
            }
        }
        // Someone else's comment: the author override already ran
        (Target::Comment { .. }, Action::Delete) => {
            if is_team_admin {
                Verdict::Allow
            } else {
                Verdict::Deny(DenyReason::NotOwner)
            }
        }
        _ => Verdict::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: GlobalRole) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            global_role: role,
            active: true,
        }
    }

    #[test]
    fn test_inactive_denied_everything() {
        let mut inactive_admin = actor(GlobalRole::AppAdmin);
        inactive_admin.active = false;

        assert_eq!(
            evaluate(&inactive_admin, Action::Read, Target::Team, None),
            Err(DenyReason::Inactive)
        );
        assert_eq!(
            evaluate(&inactive_admin, Action::Create, Target::TeamCreation, None),
            Err(DenyReason::Inactive)
        );
    }

    #[test]
    fn test_app_admin_bypasses_membership() {
        let admin = actor(GlobalRole::AppAdmin);

        // No membership anywhere, yet everything team-scoped is allowed
        assert!(evaluate(&admin, Action::Read, Target::Team, None).is_ok());
        assert!(evaluate(&admin, Action::Delete, Target::Task, None).is_ok());
        assert!(evaluate(
            &admin,
            Action::Delete,
            Target::Comment { author_id: Uuid::new_v4() },
            None
        )
        .is_ok());
    }

    #[test]
    fn test_non_member_denied_team_scoped_resources() {
        let user = actor(GlobalRole::User);

        assert_eq!(
            evaluate(&user, Action::Read, Target::Team, None),
            Err(DenyReason::NotAMember)
        );
        assert_eq!(
            evaluate(&user, Action::Create, Target::Task, None),
            Err(DenyReason::NotAMember)
        );
    }

    #[test]
    fn test_team_admin_global_tier_gets_no_bypass() {
        // The team_admin global tier carries no cross-team privilege
        let user = actor(GlobalRole::TeamAdmin);

        assert_eq!(
            evaluate(&user, Action::Read, Target::Team, None),
            Err(DenyReason::NotAMember)
        );
    }

    #[test]
    fn test_anyone_active_may_create_a_team() {
        let user = actor(GlobalRole::User);
        assert!(evaluate(&user, Action::Create, Target::TeamCreation, None).is_ok());
    }

    #[test]
    fn test_task_creation_requires_existing_membership() {
        // Unlike team creation, creating a task inside a team needs a
        // membership; creation grants nothing implicitly.
        let user = actor(GlobalRole::User);

        assert_eq!(
            evaluate(&user, Action::Create, Target::Task, None),
            Err(DenyReason::NotAMember)
        );
        assert!(evaluate(&user, Action::Create, Target::Task, Some(MembershipRole::Member)).is_ok());
    }

    #[test]
    fn test_member_level_read_create_update() {
        let user = actor(GlobalRole::User);
        let member = Some(MembershipRole::Member);

        assert!(evaluate(&user, Action::Read, Target::Team, member).is_ok());
        assert!(evaluate(&user, Action::Read, Target::Task, member).is_ok());
        assert!(evaluate(&user, Action::Update, Target::Task, member).is_ok());
        assert!(evaluate(
            &user,
            Action::Create,
            Target::Comment { author_id: user.id },
            member
        )
        .is_ok());
    }

    #[test]
    fn test_destructive_team_operations_require_team_admin() {
        let user = actor(GlobalRole::User);

        // Adding members is role-changing team management
        assert_eq!(
            evaluate(&user, Action::Update, Target::Team, Some(MembershipRole::Member)),
            Err(DenyReason::RequiresTeamAdmin)
        );
        assert!(evaluate(&user, Action::Update, Target::Team, Some(MembershipRole::Admin)).is_ok());

        assert_eq!(
            evaluate(&user, Action::Delete, Target::Task, Some(MembershipRole::Member)),
            Err(DenyReason::RequiresTeamAdmin)
        );
        assert!(evaluate(&user, Action::Delete, Target::Task, Some(MembershipRole::Admin)).is_ok());
    }

    #[test]
    fn test_comment_author_may_delete_own_comment() {
        let user = actor(GlobalRole::User);
        let own_comment = Target::Comment { author_id: user.id };

        // Author override holds even at plain member level
        assert!(evaluate(&user, Action::Delete, own_comment, Some(MembershipRole::Member)).is_ok());
    }

    #[test]
    fn test_others_comment_needs_team_admin() {
        let user = actor(GlobalRole::User);
        let someone_elses = Target::Comment { author_id: Uuid::new_v4() };

        assert_eq!(
            evaluate(&user, Action::Delete, someone_elses, Some(MembershipRole::Member)),
            Err(DenyReason::NotOwner)
        );
        assert!(evaluate(&user, Action::Delete, someone_elses, Some(MembershipRole::Admin)).is_ok());
    }

    #[test]
    fn test_user_surface_is_app_admin_only() {
        let user = actor(GlobalRole::User);
        let target = Target::User { target_id: Uuid::new_v4() };

        assert_eq!(
            evaluate(&user, Action::Update, target, None),
            Err(DenyReason::RequiresAppAdmin)
        );

        let admin = actor(GlobalRole::AppAdmin);
        assert!(evaluate(&admin, Action::Update, target, None).is_ok());
        assert!(evaluate(&admin, Action::Delete, target, None).is_ok());
    }

    #[test]
    fn test_self_delete_rejected_even_for_app_admin() {
        let admin = actor(GlobalRole::AppAdmin);

        assert_eq!(
            evaluate(&admin, Action::Delete, Target::User { target_id: admin.id }, None),
            Err(DenyReason::CannotSelfDelete)
        );
    }

    #[test]
    fn test_promotion_takes_effect_with_live_role() {
        // A token issued while the user held role=user still circulates,
        // but the evaluator only ever sees the live role. Promote the
        // identity and the same request flips to allowed.
        let id = Uuid::new_v4();
        let before = Actor { id, global_role: GlobalRole::User, active: true };
        let after = Actor { id, global_role: GlobalRole::AppAdmin, active: true };

        let target = Target::User { target_id: Uuid::new_v4() };
        assert_eq!(
            evaluate(&before, Action::Update, target, None),
            Err(DenyReason::RequiresAppAdmin)
        );
        assert!(evaluate(&after, Action::Update, target, None).is_ok());
    }
}
