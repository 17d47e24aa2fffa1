//! Garage: vehicle unlocks, selection and upgrades
//!
//! Every operation works on the save document directly and either succeeds
//! completely or returns an error with the save untouched.

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::persistence::{SaveData, VehicleRecord};
use crate::sim::VehicleModifiers;

/// Price to unlock a locked vehicle
pub const UNLOCK_PRICE: u64 = 100;
/// Upgrade price is this times the next level
pub const UPGRADE_PRICE_BASE: u64 = 100;
pub const MAX_STAT_LEVEL: u32 = 5;

/// Upgradeable vehicle stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stat {
    Acceleration,
    Speed,
    Magnet,
    Duration,
}

impl Stat {
    pub const ALL: [Stat; 4] = [Stat::Acceleration, Stat::Speed, Stat::Magnet, Stat::Duration];

    pub fn level(&self, record: &VehicleRecord) -> u32 {
        match self {
            Stat::Acceleration => record.acceleration,
            Stat::Speed => record.speed,
            Stat::Magnet => record.magnet,
            Stat::Duration => record.duration,
        }
    }

    fn level_mut<'a>(&self, record: &'a mut VehicleRecord) -> &'a mut u32 {
        match self {
            Stat::Acceleration => &mut record.acceleration,
            Stat::Speed => &mut record.speed,
            Stat::Magnet => &mut record.magnet,
            Stat::Duration => &mut record.duration,
        }
    }
}

/// Cost of raising a stat from `level` to `level + 1`
pub fn upgrade_price(level: u32) -> u64 {
    UPGRADE_PRICE_BASE * (u64::from(level) + 1)
}

fn record<'a>(save: &'a SaveData, name: &str) -> Result<&'a VehicleRecord, SimError> {
    save.vehicles
        .get(name)
        .ok_or_else(|| SimError::UnknownVehicle(name.to_string()))
}

fn charge(save: &mut SaveData, price: u64) -> Result<(), SimError> {
    if save.coins < price {
        return Err(SimError::InsufficientCurrency {
            needed: price,
            available: save.coins,
        });
    }
    save.coins -= price;
    Ok(())
}

/// Make an unlocked vehicle the active one
pub fn select(save: &mut SaveData, name: &str) -> Result<(), SimError> {
    if !record(save, name)?.unlocked {
        return Err(SimError::VehicleLocked(name.to_string()));
    }
    save.selected_vehicle = name.to_string();
    log::info!("Selected vehicle {}", name);
    Ok(())
}

/// Buy a locked vehicle. Unlocking an owned vehicle is a no-op.
pub fn unlock(save: &mut SaveData, name: &str) -> Result<(), SimError> {
    if record(save, name)?.unlocked {
        return Ok(());
    }
    charge(save, UNLOCK_PRICE)?;
    if let Some(vehicle) = save.vehicles.get_mut(name) {
        vehicle.unlocked = true;
    }
    log::info!("Unlocked vehicle {} for {} coins", name, UNLOCK_PRICE);
    Ok(())
}

/// Raise one stat by a level. Returns the new level.
pub fn upgrade(save: &mut SaveData, name: &str, stat: Stat) -> Result<u32, SimError> {
    let current = record(save, name)?;
    if !current.unlocked {
        return Err(SimError::VehicleLocked(name.to_string()));
    }
    let level = stat.level(current);
    if level >= MAX_STAT_LEVEL {
        return Err(SimError::MaxLevel(format!("{name} {stat:?}")));
    }
    let price = upgrade_price(level);
    charge(save, price)?;

    let mut new_level = level;
    if let Some(vehicle) = save.vehicles.get_mut(name) {
        let slot = stat.level_mut(vehicle);
        *slot += 1;
        new_level = *slot;
    }
    log::info!("Upgraded {} {:?} to {} for {} coins", name, stat, new_level, price);
    Ok(new_level)
}

/// Simulation modifiers for a vehicle's upgrade levels. Level 1 is the
/// baseline; lower levels count as 1.
pub fn modifiers(record: &VehicleRecord) -> VehicleModifiers {
    let scale = |level: u32| 1.0 + 0.1 * (level.max(1) - 1) as f32;
    VehicleModifiers {
        effect_duration_scale: scale(record.duration),
        magnet_radius_scale: scale(record.magnet),
    }
}

/// Modifiers for the currently selected vehicle, baseline if it is missing
pub fn selected_modifiers(save: &SaveData) -> VehicleModifiers {
    save.vehicles
        .get(&save.selected_vehicle)
        .map(modifiers)
        .unwrap_or_default()
}
