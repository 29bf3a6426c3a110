//! Read-only lookup of the vehicles and users that ads are built from.
//!
//! Both entities belong to the wider dealership system. The sync core only
//! needs to read them, so the directory is loaded once at startup and shared
//! behind an `Arc` without locking.

use std::collections::HashMap;
use std::path::Path;

use adsync_shared::{UserProfile, Vehicle};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// On-disk seed format: `{"vehicles": [...], "users": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectorySeed {
    #[serde(default)]
    pub vehicles: Vec<Vehicle>,
    #[serde(default)]
    pub users: Vec<UserProfile>,
}

#[derive(Debug, Clone, Default)]
pub struct Directory {
    vehicles: HashMap<String, Vehicle>,
    users: HashMap<String, UserProfile>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: DirectorySeed) -> Self {
        let mut dir = Self::new();
        for vehicle in seed.vehicles {
            dir.insert_vehicle(vehicle);
        }
        for user in seed.users {
            dir.insert_user(user);
        }
        dir
    }

    /// Load a JSON seed file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let seed: DirectorySeed = serde_json::from_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            vehicles = seed.vehicles.len(),
            users = seed.users.len(),
            "Loaded directory seed"
        );
        Ok(Self::from_seed(seed))
    }

    /// Demo inventory used when no seed file is configured.
    pub fn sample() -> Self {
        Self::from_seed(DirectorySeed {
            vehicles: vec![
                Vehicle {
                    id: "vehicle-1".into(),
                    vin: "1HGCM82633A123456".into(),
                    make: "Honda".into(),
                    model: "Accord".into(),
                    year: 2024,
                    trim: Some("LX".into()),
                    color: Some("Silver".into()),
                    mileage: Some(50),
                    price: Some(28500.0),
                },
                Vehicle {
                    id: "vehicle-2".into(),
                    vin: "4T1BF1FK8EU456789".into(),
                    make: "Toyota".into(),
                    model: "Camry".into(),
                    year: 2024,
                    trim: Some("LE".into()),
                    color: Some("Blue".into()),
                    mileage: Some(100),
                    price: Some(27000.0),
                },
            ],
            users: vec![UserProfile {
                id: "user-1".into(),
                name: "John Smith".into(),
                email: "john@automax.com".into(),
                phone: Some("(555) 123-4567".into()),
                dealership: Some("AutoMax Dealership".into()),
            }],
        })
    }

    pub fn insert_vehicle(&mut self, vehicle: Vehicle) {
        self.vehicles.insert(vehicle.id.clone(), vehicle);
    }

    pub fn insert_user(&mut self, user: UserProfile) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn vehicle(&self, id: &str) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    pub fn user(&self, id: &str) -> Option<&UserProfile> {
        self.users.get(id)
    }
}
