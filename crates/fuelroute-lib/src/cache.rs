//! Bounded, single-flight cache of computed fuel stop plans.
//!
//! Each key owns a slot holding a [`OnceCell`]. Concurrent requests for the
//! same key share the slot: one caller computes, the others block on the cell
//! and receive the same `Arc`. Requests for different keys only contend on the
//! map shard while fetching their slot, never while a plan is computed.
//!
//! Entries expire after a fixed TTL and the map is kept under a capacity bound
//! by evicting the oldest completed plans first. Failed computations leave the
//! cell empty so the next caller computes afresh.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::Result;
use crate::path::RoutePath;
use crate::planner::{FuelStopPlan, PlanOptions, PlanStrategy, RefuelPolicy, VehicleProfile};

/// Default time-to-live of cached plans.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Default maximum number of cached plans.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Version tag mixed into every fingerprint so layout changes never collide.
const FINGERPRINT_DOMAIN: &[u8] = b"fuelroute-plan-v1";

/// SHA-256 digest identifying one planning request.
///
/// Covers the path geometry, total distance, vehicle profile, planner options,
/// corridor width and catalog generation: everything that can change the plan.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteFingerprint([u8; 32]);

impl RouteFingerprint {
    /// Compute the fingerprint of a planning request.
    pub fn compute(
        path: &RoutePath,
        vehicle: &VehicleProfile,
        options: &PlanOptions,
        corridor_miles: f64,
        catalog_generation: u64,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(FINGERPRINT_DOMAIN);

        hasher.update((path.len() as u64).to_le_bytes());
        for point in path.points() {
            hasher.update(point.latitude.to_bits().to_le_bytes());
            hasher.update(point.longitude.to_bits().to_le_bytes());
        }
        hasher.update(path.total_distance().to_bits().to_le_bytes());

        hasher.update(vehicle.miles_per_gallon.to_bits().to_le_bytes());
        hasher.update(vehicle.range_miles.to_bits().to_le_bytes());
        hasher.update(vehicle.tank_capacity_gallons.to_bits().to_le_bytes());

        hasher.update(options.safety_factor.to_bits().to_le_bytes());
        hasher.update([strategy_tag(options.strategy), policy_tag(options.refuel_policy)]);
        hasher.update(corridor_miles.to_bits().to_le_bytes());
        hasher.update(catalog_generation.to_le_bytes());

        Self(hasher.finalize().into())
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

fn strategy_tag(strategy: PlanStrategy) -> u8 {
    match strategy {
        PlanStrategy::Greedy => 0,
        PlanStrategy::Optimal => 1,
    }
}

fn policy_tag(policy: RefuelPolicy) -> u8 {
    match policy {
        RefuelPolicy::MinimumForNextLeg => 0,
        RefuelPolicy::FillTank => 1,
    }
}

impl fmt::Display for RouteFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for RouteFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RouteFingerprint({self})")
    }
}

#[derive(Debug)]
struct StoredPlan {
    plan: Arc<FuelStopPlan>,
    stored_at: Instant,
}

impl StoredPlan {
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.duration_since(self.stored_at) > ttl
    }
}

#[derive(Debug, Default)]
struct Slot {
    cell: OnceCell<StoredPlan>,
}

impl Slot {
    fn ready(plan: Arc<FuelStopPlan>) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(StoredPlan {
            plan,
            stored_at: Instant::now(),
        });
        Self { cell }
    }

    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        self.cell.get().is_some_and(|stored| stored.is_expired(ttl, now))
    }
}

/// Empty slot held only by the map: its computation failed and no caller is
/// waiting to retry it.
fn is_abandoned(slot: &Arc<Slot>) -> bool {
    slot.cell.get().is_none() && Arc::strong_count(slot) == 1
}

/// Concurrent plan cache keyed by [`RouteFingerprint`].
#[derive(Debug)]
pub struct PlanCache {
    slots: DashMap<RouteFingerprint, Arc<Slot>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for PlanCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL, DEFAULT_CACHE_CAPACITY)
    }
}

impl PlanCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            slots: DashMap::new(),
            ttl,
            capacity,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cached plan for `key`, unless absent, in flight, or expired.
    pub fn get(&self, key: &RouteFingerprint) -> Option<Arc<FuelStopPlan>> {
        let slot = self.slots.get(key).map(|entry| Arc::clone(entry.value()))?;
        let stored = slot.cell.get()?;
        if stored.is_expired(self.ttl, Instant::now()) {
            self.slots.remove_if(key, |_, current| Arc::ptr_eq(current, &slot));
            return None;
        }
        Some(Arc::clone(&stored.plan))
    }

    /// Store a plan, replacing any previous entry for `key`.
    pub fn put(&self, key: RouteFingerprint, plan: Arc<FuelStopPlan>) {
        self.slots.insert(key, Arc::new(Slot::ready(plan)));
        self.prune();
    }

    /// Return the cached plan for `key`, computing it with `compute` if needed.
    ///
    /// At most one computation per key runs at a time; concurrent callers wait
    /// for it and share its result. Errors are returned to the caller that ran
    /// the computation and are not cached; a waiting caller then computes in
    /// the same slot.
    pub fn get_or_try_insert_with<F>(&self, key: RouteFingerprint, compute: F) -> Result<Arc<FuelStopPlan>>
    where
        F: FnOnce() -> Result<FuelStopPlan>,
    {
        let now = Instant::now();
        let slot = {
            let mut entry = self.slots.entry(key).or_default();
            if entry.is_expired(self.ttl, now) {
                *entry = Arc::new(Slot::default());
            }
            Arc::clone(entry.value())
        };

        if let Some(stored) = slot.cell.get() {
            debug!(key = %key, "plan cache hit");
            return Ok(Arc::clone(&stored.plan));
        }

        let outcome = slot
            .cell
            .get_or_try_init(|| {
                debug!(key = %key, "plan cache miss; computing");
                compute().map(|plan| StoredPlan {
                    plan: Arc::new(plan),
                    stored_at: Instant::now(),
                })
            })
            .map(|stored| Arc::clone(&stored.plan));

        match outcome {
            Ok(plan) => {
                self.prune();
                Ok(plan)
            }
            Err(err) => {
                // Waiters retry in this slot; it stays mapped while they hold it.
                drop(slot);
                self.slots.remove_if(&key, |_, current| is_abandoned(current));
                Err(err)
            }
        }
    }

    /// Drop every cached plan.
    pub fn invalidate_all(&self) {
        self.slots.clear();
    }

    /// Number of slots, including in-flight computations.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Remove expired plans and empty slots nobody is waiting on, then evict
    /// the oldest completed plans until the cache fits its capacity. In-flight
    /// slots are never evicted.
    fn prune(&self) {
        let now = Instant::now();
        let mut completed: Vec<(RouteFingerprint, Instant)> = Vec::new();
        let mut expired: Vec<RouteFingerprint> = Vec::new();
        let mut abandoned: Vec<RouteFingerprint> = Vec::new();

        for entry in self.slots.iter() {
            match entry.value().cell.get() {
                Some(stored) if stored.is_expired(self.ttl, now) => expired.push(*entry.key()),
                Some(stored) => completed.push((*entry.key(), stored.stored_at)),
                None if is_abandoned(entry.value()) => abandoned.push(*entry.key()),
                None => {}
            }
        }

        for key in &expired {
            self.slots.remove_if(key, |_, slot| slot.is_expired(self.ttl, now));
        }
        for key in &abandoned {
            self.slots.remove_if(key, |_, slot| is_abandoned(slot));
        }

        if self.slots.len() <= self.capacity {
            return;
        }

        completed.sort_by_key(|(_, stored_at)| *stored_at);
        let mut evicted = 0usize;
        for (key, _) in completed {
            if self.slots.len() <= self.capacity {
                break;
            }
            if self.slots.remove(&key).is_some() {
                evicted += 1;
            }
        }
        debug!(
            expired = expired.len(),
            abandoned = abandoned.len(),
            evicted,
            remaining = self.slots.len(),
            "pruned plan cache"
        );
    }
}
