//! Reviewer selection
//!
//! Pure functions over already-loaded team members; the caller supplies
//! the RNG so selection is reproducible under a fixed seed.

use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use crate::db::repos::User;

/// Upper bound on reviewers assigned when a PR is opened.
pub const MAX_INITIAL_REVIEWERS: usize = 2;

/// Up to [`MAX_INITIAL_REVIEWERS`] active team members other than the
/// author, drawn uniformly at random. Returned in assignment order.
pub fn pick_initial_reviewers<R>(rng: &mut R, members: &[User], author_id: Uuid) -> Vec<User>
where
    R: Rng + ?Sized,
{
    let mut eligible: Vec<&User> = members
        .iter()
        .filter(|user| user.is_active && user.id != author_id)
        .collect();

    eligible.shuffle(rng);
    eligible
        .into_iter()
        .take(MAX_INITIAL_REVIEWERS)
        .cloned()
        .collect()
}

/// One active team member to replace `old_reviewer_id`, uniformly at
/// random. Members already reviewing the PR (`current`) are skipped so a
/// reviewer is never assigned twice. `None` when nobody qualifies.
pub fn pick_replacement<R>(
    rng: &mut R,
    members: &[User],
    old_reviewer_id: Uuid,
    current: &[Uuid],
) -> Option<User>
where
    R: Rng + ?Sized,
{
    let candidates: Vec<&User> = members
        .iter()
        .filter(|user| user.is_active && user.id != old_reviewer_id && !current.contains(&user.id))
        .collect();

    candidates.choose(rng).map(|user| (*user).clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn user(name: &str, is_active: bool) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            external_id: name.to_owned(),
            username: name.to_uppercase(),
            email: format!("{name}@example.com"),
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    fn team() -> Vec<User> {
        vec![
            user("author", true),
            user("r1", true),
            user("r2", true),
            user("r3", true),
            user("idle", false),
        ]
    }

    #[test]
    fn initial_reviewers_are_active_members_other_than_author() {
        let members = team();
        let author = members[0].id;

        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = pick_initial_reviewers(&mut rng, &members, author);

            assert_eq!(picked.len(), MAX_INITIAL_REVIEWERS);
            let ids: HashSet<Uuid> = picked.iter().map(|u| u.id).collect();
            assert_eq!(ids.len(), picked.len(), "duplicate reviewer");
            for reviewer in &picked {
                assert!(reviewer.is_active);
                assert_ne!(reviewer.id, author);
                assert!(members.iter().any(|m| m.id == reviewer.id));
            }
        }
    }

    #[test]
    fn fewer_eligible_than_limit_assigns_all_of_them() {
        let members = vec![user("author", true), user("only", true), user("idle", false)];
        let mut rng = StdRng::seed_from_u64(7);

        let picked = pick_initial_reviewers(&mut rng, &members, members[0].id);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].external_id, "only");
    }

    #[test]
    fn no_eligible_members_is_not_an_error() {
        let members = vec![user("author", true), user("idle", false)];
        let mut rng = StdRng::seed_from_u64(7);

        assert!(pick_initial_reviewers(&mut rng, &members, members[0].id).is_empty());
    }

    #[test]
    fn same_seed_same_choice() {
        let members = team();
        let author = members[0].id;

        let first = pick_initial_reviewers(&mut StdRng::seed_from_u64(42), &members, author);
        let second = pick_initial_reviewers(&mut StdRng::seed_from_u64(42), &members, author);
        assert_eq!(first, second);
    }

    #[test]
    fn every_eligible_member_gets_picked_eventually() {
        let members = team();
        let author = members[0].id;
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = HashSet::new();

        for _ in 0..200 {
            for reviewer in pick_initial_reviewers(&mut rng, &members, author) {
                seen.insert(reviewer.external_id);
            }
        }

        let expected: HashSet<String> = ["r1", "r2", "r3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn replacement_is_active_and_not_the_old_reviewer() {
        let members = team();
        let old = members[1].id;

        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = pick_replacement(&mut rng, &members, old, &[old]).unwrap();
            assert!(picked.is_active);
            assert_ne!(picked.id, old);
        }
    }

    #[test]
    fn replacement_skips_current_reviewers() {
        let members = team();
        let (old, other) = (members[1].id, members[2].id);

        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = pick_replacement(&mut rng, &members, old, &[old, other]).unwrap();
            assert_ne!(picked.id, other);
        }
    }

    #[test]
    fn replacement_may_be_the_author() {
        let members = vec![user("author", true), user("r1", true), user("r2", true)];
        let current = [members[1].id, members[2].id];
        let mut rng = StdRng::seed_from_u64(3);

        let picked = pick_replacement(&mut rng, &members, members[1].id, &current).unwrap();
        assert_eq!(picked.external_id, "author");
    }

    #[test]
    fn no_candidate_when_everyone_else_is_inactive() {
        let members = vec![user("r1", true), user("idle", false)];
        let mut rng = StdRng::seed_from_u64(3);

        assert!(pick_replacement(&mut rng, &members, members[0].id, &[members[0].id]).is_none());
    }
}
