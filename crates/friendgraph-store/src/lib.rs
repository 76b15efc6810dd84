//! The in-memory user graph.
//!
//! All users live in one map behind a single [`RwLock`]. Every operation
//! that touches more than one record (friendship, deletion, creation with
//! initial friends) holds the write guard for its whole duration, so no
//! reader ever sees one side of an edge without the other.

mod error;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use fastrace::trace;
use friendgraph_types::{User, UserId};
use rustc_hash::FxHashMap;
use tracing::debug;

pub use error::StoreError;

type UserMap = FxHashMap<UserId, User>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub users: usize,
    pub friendships: usize,
    pub next_id: u64,
}

pub struct UserGraphStore {
    next_id: AtomicU64,
    users: RwLock<UserMap>,
}

impl Default for UserGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserGraphStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            users: RwLock::new(UserMap::default()),
        }
    }

    // No operation can panic between its first and last write, so a poisoned
    // guard still protects a consistent map.
    fn read(&self) -> RwLockReadGuard<'_, UserMap> {
        self.users.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserMap> {
        self.users.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[trace]
    pub fn create_user(&self, name: &str, age: &str) -> Result<UserId, StoreError> {
        self.create_user_with_friends(name, age, &[])
    }

    /// Creates a user already linked to `friends`. Either every listed friend
    /// exists and all reverse edges are written, or nothing is created.
    #[trace]
    pub fn create_user_with_friends(
        &self,
        name: &str,
        age: &str,
        friends: &[UserId],
    ) -> Result<UserId, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::InvalidInput("name must not be empty".to_string()));
        }

        let mut users = self.write();
        if let Some(missing) = friends.iter().find(|id| !users.contains_key(id.as_str())) {
            return Err(StoreError::NotFound(missing.clone()));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        let mut user = User::new(id.clone(), name.to_string(), age.to_string());
        for friend_id in friends {
            if user.add_friend(friend_id) {
                if let Some(friend) = users.get_mut(friend_id) {
                    friend.add_friend(&id);
                }
            }
        }

        debug!("Created user {} ({}) with {} friends", id, name, user.degree());
        users.insert(id.clone(), user);
        Ok(id)
    }

    /// Links two users in both directions and returns their names
    /// (source first). Repeating the call is a no-op.
    #[trace]
    pub fn add_friendship(
        &self,
        source_id: &str,
        target_id: &str,
    ) -> Result<(String, String), StoreError> {
        if source_id == target_id {
            return Err(StoreError::InvalidInput(
                "a user cannot befriend themselves".to_string(),
            ));
        }

        let mut users = self.write();
        for id in [source_id, target_id] {
            if !users.contains_key(id) {
                return Err(StoreError::NotFound(id.to_string()));
            }
        }

        let Some(source) = users.get_mut(source_id) else {
            return Err(StoreError::NotFound(source_id.to_string()));
        };
        let added = source.add_friend(target_id);
        let source_name = source.name.clone();

        let Some(target) = users.get_mut(target_id) else {
            return Err(StoreError::NotFound(target_id.to_string()));
        };
        target.add_friend(source_id);
        let target_name = target.name.clone();

        if added {
            debug!("Linked {} and {}", source_id, target_id);
        }
        Ok((source_name, target_name))
    }

    /// Removes the user and prunes it from each former friend. Cost is
    /// proportional to the user's degree, not to the number of users.
    #[trace]
    pub fn delete_user(&self, target_id: &str) -> Result<String, StoreError> {
        let mut users = self.write();
        let user = users
            .remove(target_id)
            .ok_or_else(|| StoreError::NotFound(target_id.to_string()))?;

        for friend_id in &user.friends {
            if let Some(friend) = users.get_mut(friend_id) {
                friend.remove_friend(target_id);
            }
        }

        debug!("Deleted user {} and {} edges", target_id, user.degree());
        Ok(user.name)
    }

    #[trace]
    pub fn list_friends(&self, user_id: &str) -> Result<Vec<UserId>, StoreError> {
        self.read()
            .get(user_id)
            .map(|user| user.friends.clone())
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))
    }

    /// Age is stored verbatim; no numeric validation is applied.
    #[trace]
    pub fn update_age(&self, user_id: &str, new_age: &str) -> Result<(), StoreError> {
        let mut users = self.write();
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))?;
        user.age = new_age.to_string();
        Ok(())
    }

    #[trace]
    pub fn get_user(&self, user_id: &str) -> Result<User, StoreError> {
        self.read()
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))
    }

    pub fn stats(&self) -> StoreStats {
        let users = self.read();
        let endpoints: usize = users.values().map(User::degree).sum();
        StoreStats {
            users: users.len(),
            friendships: endpoints / 2,
            next_id: self.next_id.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn assert_symmetric(store: &UserGraphStore) {
        let users = store.read();
        for user in users.values() {
            for friend_id in &user.friends {
                let friend = users
                    .get(friend_id)
                    .unwrap_or_else(|| panic!("{} points at missing user {}", user.id, friend_id));
                assert!(
                    friend.is_friends_with(&user.id),
                    "{} -> {} has no reverse edge",
                    user.id,
                    friend_id
                );
            }
            let mut unique = user.friends.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), user.friends.len(), "duplicate edge on {}", user.id);
        }
    }

    #[test]
    fn test_alice_and_bob() {
        let store = UserGraphStore::new();
        let alice = store.create_user("Alice", "30").unwrap();
        let bob = store.create_user("Bob", "25").unwrap();
        assert_eq!(alice, "1");
        assert_eq!(bob, "2");

        let (a, b) = store.add_friendship(&alice, &bob).unwrap();
        assert_eq!(format!("{} and {} are now friends", a, b), "Alice and Bob are now friends");
        assert_eq!(store.list_friends(&alice).unwrap(), vec!["2"]);
        assert_eq!(store.list_friends(&bob).unwrap(), vec!["1"]);

        assert_eq!(store.delete_user(&alice).unwrap(), "Alice");
        assert!(store.list_friends(&bob).unwrap().is_empty());
        assert_eq!(
            store.list_friends(&alice).unwrap_err(),
            StoreError::NotFound("1".to_string())
        );
    }

    #[test]
    fn test_update_age() {
        let store = UserGraphStore::new();
        store.create_user("Alice", "30").unwrap();
        let bob = store.create_user("Bob", "25").unwrap();

        store.update_age(&bob, "31").unwrap();
        assert_eq!(store.get_user(&bob).unwrap().age, "31");

        store.update_age(&bob, "thirty-two").unwrap();
        assert_eq!(store.get_user(&bob).unwrap().age, "thirty-two");

        assert!(matches!(store.update_age("7", "1"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_add_friendship_is_idempotent() {
        let store = UserGraphStore::new();
        let a = store.create_user("A", "1").unwrap();
        let b = store.create_user("B", "2").unwrap();

        store.add_friendship(&a, &b).unwrap();
        store.add_friendship(&a, &b).unwrap();
        store.add_friendship(&b, &a).unwrap();

        assert_eq!(store.list_friends(&a).unwrap(), vec![b.clone()]);
        assert_eq!(store.list_friends(&b).unwrap(), vec![a.clone()]);
        assert_eq!(store.stats().friendships, 1);
    }

    #[test]
    fn test_add_friendship_rejects_self_and_missing() {
        let store = UserGraphStore::new();
        let a = store.create_user("A", "1").unwrap();

        assert!(matches!(
            store.add_friendship(&a, &a),
            Err(StoreError::InvalidInput(_))
        ));
        assert_eq!(
            store.add_friendship(&a, "42").unwrap_err(),
            StoreError::NotFound("42".to_string())
        );
        assert_eq!(
            store.add_friendship("42", &a).unwrap_err(),
            StoreError::NotFound("42".to_string())
        );
        assert!(store.list_friends(&a).unwrap().is_empty());
    }

    #[test]
    fn test_missing_user_operations() {
        let store = UserGraphStore::new();
        assert!(matches!(store.delete_user("1"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.list_friends("1"), Err(StoreError::NotFound(_))));
        assert!(matches!(store.get_user("1"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let store = UserGraphStore::new();
        assert!(matches!(store.create_user("", "1"), Err(StoreError::InvalidInput(_))));
        assert!(matches!(store.create_user("   ", "1"), Err(StoreError::InvalidInput(_))));
        assert_eq!(store.stats().users, 0);
        assert_eq!(store.create_user("C", "").unwrap(), "1");
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let store = UserGraphStore::new();
        let a = store.create_user("A", "1").unwrap();
        let b = store.create_user("B", "2").unwrap();
        store.delete_user(&a).unwrap();
        let c = store.create_user("C", "3").unwrap();
        assert_eq!(c, "3");
        assert_ne!(c, b);
    }

    #[test]
    fn test_delete_prunes_every_former_friend() {
        let store = UserGraphStore::new();
        let hub = store.create_user("Hub", "1").unwrap();
        let spokes: Vec<_> = (0..5)
            .map(|i| store.create_user(&format!("S{}", i), "1").unwrap())
            .collect();
        for spoke in &spokes {
            store.add_friendship(&hub, spoke).unwrap();
        }
        store.add_friendship(&spokes[0], &spokes[1]).unwrap();

        store.delete_user(&hub).unwrap();

        for spoke in &spokes {
            assert!(!store.list_friends(spoke).unwrap().contains(&hub));
        }
        assert_eq!(store.list_friends(&spokes[0]).unwrap(), vec![spokes[1].clone()]);
        assert_symmetric(&store);
    }

    #[test]
    fn test_create_with_initial_friends() {
        let store = UserGraphStore::new();
        let a = store.create_user("A", "1").unwrap();
        let b = store.create_user("B", "2").unwrap();

        let c = store
            .create_user_with_friends("C", "3", &[a.clone(), b.clone(), a.clone()])
            .unwrap();
        assert_eq!(store.list_friends(&c).unwrap(), vec![a.clone(), b.clone()]);
        assert_eq!(store.list_friends(&a).unwrap(), vec![c.clone()]);
        assert_eq!(store.list_friends(&b).unwrap(), vec![c.clone()]);
        assert_symmetric(&store);
    }

    #[test]
    fn test_create_with_missing_friend_creates_nothing() {
        let store = UserGraphStore::new();
        let a = store.create_user("A", "1").unwrap();

        let err = store
            .create_user_with_friends("C", "3", &[a.clone(), "9".to_string()])
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound("9".to_string()));
        assert_eq!(store.stats().users, 1);
        assert!(store.list_friends(&a).unwrap().is_empty());
        assert_eq!(store.create_user("D", "4").unwrap(), "2");
    }

    #[test]
    fn test_stats() {
        let store = UserGraphStore::new();
        let a = store.create_user("A", "1").unwrap();
        let b = store.create_user("B", "2").unwrap();
        let c = store.create_user("C", "3").unwrap();
        store.add_friendship(&a, &b).unwrap();
        store.add_friendship(&b, &c).unwrap();

        assert_eq!(
            store.stats(),
            StoreStats {
                users: 3,
                friendships: 2,
                next_id: 4,
            }
        );
    }

    #[test]
    fn test_concurrent_creates_get_distinct_ids() {
        let store = Arc::new(UserGraphStore::new());
        let mut ids: Vec<UserId> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|t| {
                    let store = Arc::clone(&store);
                    s.spawn(move || {
                        (0..100)
                            .map(|i| store.create_user(&format!("u{}-{}", t, i), "1").unwrap())
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(ids.len(), 800);
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 800);
        assert_eq!(store.stats().users, 800);
    }

    #[test]
    fn test_concurrent_add_same_pair_leaves_one_edge() {
        let store = UserGraphStore::new();
        let a = store.create_user("A", "1").unwrap();
        let b = store.create_user("B", "2").unwrap();

        std::thread::scope(|s| {
            for i in 0..16 {
                let (src, dst) = if i % 2 == 0 { (&a, &b) } else { (&b, &a) };
                let store = &store;
                s.spawn(move || store.add_friendship(src, dst).unwrap());
            }
        });

        assert_eq!(store.list_friends(&a).unwrap(), vec![b.clone()]);
        assert_eq!(store.list_friends(&b).unwrap(), vec![a.clone()]);
    }

    #[test]
    fn test_concurrent_add_and_delete_keep_symmetry() {
        let store = UserGraphStore::new();
        let ids: Vec<_> = (0..20)
            .map(|i| store.create_user(&format!("u{}", i), "1").unwrap())
            .collect();

        std::thread::scope(|s| {
            for t in 0..4 {
                let store = &store;
                let ids = &ids;
                s.spawn(move || {
                    for i in 0..ids.len() {
                        let j = (i * 7 + t + 1) % ids.len();
                        // Either endpoint may already be gone.
                        let _ = store.add_friendship(&ids[i], &ids[j]);
                    }
                });
            }
            let store = &store;
            let ids = &ids;
            s.spawn(move || {
                for id in ids.iter().step_by(3) {
                    store.delete_user(id).unwrap();
                    let _ = store.list_friends(id);
                }
            });
        });

        assert_symmetric(&store);
        for id in ids.iter().step_by(3) {
            assert!(matches!(store.get_user(id), Err(StoreError::NotFound(_))));
        }
    }
}
