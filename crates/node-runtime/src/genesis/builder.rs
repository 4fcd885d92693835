//! # Genesis Builder
//!
//! Turns a [`GenesisConfig`] into per-module delta lists.

use sd_02_execution_context::ChangeContext;
use seed_modules::{cube_runner::wall_key, CUBE_RUNNER_MODULE, SEED_MODULE};
use serde::{Deserialize, Serialize};
use shared_types::{Amount, Delta, ModuleName, UserId};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Genesis allocation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenesisError {
    #[error("Negative genesis balance for {user}: {amount}")]
    NegativeBalance { user: UserId, amount: Amount },

    #[error("Genesis supply overflows")]
    SupplyOverflow,

    #[error("Coordinate ({x}, {y}) outside the {width}x{height} world")]
    OutOfWorld { x: i64, y: i64, width: i64, height: i64 },

    #[error("Wall at ({x}, {y}) would sit on a player")]
    WallOnPlayer { x: i64, y: i64 },

    #[error("Genesis targets module {0}, which is not registered")]
    UnknownModule(String),

    #[error("Failed to apply genesis to {module}: {reason}")]
    ApplyFailed { module: String, reason: String },
}

/// Initial state beyond each module's declared defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Initial SEED balances; their sum becomes `totalSupply`.
    pub balances: BTreeMap<UserId, Amount>,
    /// Initial CubeRunner positions.
    pub positions: BTreeMap<UserId, (i64, i64)>,
    /// Initial CubeRunner walls.
    pub walls: Vec<(i64, i64)>,
    /// CubeRunner world size, must match the module's `width`/`height`.
    pub world_size: (i64, i64),
}

impl GenesisConfig {
    /// Empty allocation for the default 64x64 world.
    pub fn empty() -> Self {
        Self {
            world_size: (
                seed_modules::cube_runner::DEFAULT_WORLD_SIZE,
                seed_modules::cube_runner::DEFAULT_WORLD_SIZE,
            ),
            ..Self::default()
        }
    }

    /// The canonical devnet scenario: `A` holds 100 SEED, `B` holds none,
    /// and a short wall stands at x = 10.
    pub fn devnet() -> Self {
        let mut config = Self::empty();
        config.balances.insert(UserId::from("A"), 100);
        config.balances.insert(UserId::from("B"), 0);
        config.walls = (5..10).map(|y| (10, y)).collect();
        config
    }

    pub fn with_balance(mut self, user: &str, amount: Amount) -> Self {
        self.balances.insert(UserId::from(user), amount);
        self
    }

    pub fn with_position(mut self, user: &str, x: i64, y: i64) -> Self {
        self.positions.insert(UserId::from(user), (x, y));
        self
    }

    pub fn with_wall(mut self, x: i64, y: i64) -> Self {
        self.walls.push((x, y));
        self
    }
}

/// Deltas to commit at boot, one list per module.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenesisAllocation {
    pub modules: BTreeMap<ModuleName, Vec<Delta>>,
    pub total_supply: Amount,
}

pub struct GenesisBuilder {
    config: GenesisConfig,
}

impl GenesisBuilder {
    pub fn new(config: GenesisConfig) -> Self {
        Self { config }
    }

    /// Validate the configuration and produce the allocation.
    pub fn build(&self) -> Result<GenesisAllocation, GenesisError> {
        let mut allocation = GenesisAllocation::default();

        let seed = self.seed_deltas(&mut allocation.total_supply)?;
        if !seed.is_empty() {
            allocation.modules.insert(SEED_MODULE.to_string(), seed.into_deltas());
        }

        let cube_runner = self.cube_runner_deltas()?;
        if !cube_runner.is_empty() {
            allocation
                .modules
                .insert(CUBE_RUNNER_MODULE.to_string(), cube_runner.into_deltas());
        }

        Ok(allocation)
    }

    fn seed_deltas(&self, total_supply: &mut Amount) -> Result<ChangeContext, GenesisError> {
        let mut ctx = ChangeContext::new();
        let mut supply: Amount = 0;

        for (user, amount) in &self.config.balances {
            if *amount < 0 {
                return Err(GenesisError::NegativeBalance {
                    user: user.clone(),
                    amount: *amount,
                });
            }
            supply = supply.checked_add(*amount).ok_or(GenesisError::SupplyOverflow)?;
            ctx.add(user, "balance", *amount);
        }
        if supply > 0 {
            ctx.add_module("totalSupply", supply);
        }

        *total_supply = supply;
        Ok(ctx)
    }

    fn cube_runner_deltas(&self) -> Result<ChangeContext, GenesisError> {
        let mut ctx = ChangeContext::new();
        let mut occupied: BTreeSet<(i64, i64)> = BTreeSet::from([(0, 0)]);

        for (user, (x, y)) in &self.config.positions {
            self.check_in_world(*x, *y)?;
            occupied.insert((*x, *y));
            if *x > 0 {
                ctx.add(user, "x", *x);
            }
            if *y > 0 {
                ctx.add(user, "y", *y);
            }
        }

        let walls: BTreeSet<(i64, i64)> = self.config.walls.iter().copied().collect();
        for (x, y) in walls {
            self.check_in_world(x, y)?;
            if occupied.contains(&(x, y)) {
                return Err(GenesisError::WallOnPlayer { x, y });
            }
            ctx.add_module_nested("walls", &wall_key(x, y), 1);
        }

        Ok(ctx)
    }

    fn check_in_world(&self, x: i64, y: i64) -> Result<(), GenesisError> {
        let (width, height) = self.config.world_size;
        if (0..width).contains(&x) && (0..height).contains(&y) {
            Ok(())
        } else {
            Err(GenesisError::OutOfWorld { x, y, width, height })
        }
    }
}
