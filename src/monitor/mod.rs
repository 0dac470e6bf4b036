use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::auth::Authenticator;
use crate::error::MonitorError;
use crate::esi::{EsiStructure, StructureApi};

mod schedule;
mod status;

pub use schedule::Notifier;
pub use status::{Alert, StructureStatus};

/// Structures running out of fuel within this window raise an alert.
const LOW_FUEL_WINDOW_DAYS: i64 = 2;

pub struct StructureMonitor {
    auth: Arc<dyn Authenticator>,
    api: Arc<dyn StructureApi>,
    corporation_id: u64,
    snapshot: HashMap<u64, StructureStatus>,
}

impl StructureMonitor {
    pub fn new(
        auth: Arc<dyn Authenticator>,
        api: Arc<dyn StructureApi>,
        corporation_id: u64,
    ) -> Self {
        Self {
            auth,
            api,
            corporation_id,
            snapshot: HashMap::new(),
        }
    }

    pub fn snapshot(&self) -> &HashMap<u64, StructureStatus> {
        &self.snapshot
    }

    /// Runs one poll tick. Failures are logged and yield no alerts.
    pub async fn poll(&mut self) -> Vec<Alert> {
        info!("Checking structures of corporation {}", self.corporation_id);

        let (bearer_token, structures) = match self.fetch_structures().await {
            Ok(result) => result,
            Err(error) => {
                warn!("Skipping structure check: {}", error);
                return Vec::new();
            }
        };
        info!("Fetched {} structures", structures.len());

        let mut named = Vec::with_capacity(structures.len());
        for structure in structures {
            let name = match self
                .api
                .lookup_structure_name(structure.structure_id, &bearer_token)
                .await
            {
                Ok(name) => name,
                Err(error) => {
                    warn!(
                        "[{}] Failed to lookup structure name: {}",
                        structure.structure_id, error
                    );
                    format!("Structure {}", structure.structure_id)
                }
            };
            named.push((structure, name));
        }

        let alerts = self.compare(named, Utc::now());
        info!(
            "Check completed with {} alerts, {} structures known",
            alerts.len(),
            self.snapshot().len()
        );
        alerts
    }

    async fn fetch_structures(&self) -> Result<(String, Vec<EsiStructure>), MonitorError> {
        let mut bearer_token = self
            .auth
            .bearer_token()
            .await
            .ok_or(MonitorError::AuthMissing)?;

        let (mut status, mut body) = self
            .api
            .fetch_structures(self.corporation_id, &bearer_token)
            .await
            .map_err(MonitorError::Fetch)?;

        if status == 401 {
            info!("Access token expired, trying to refresh");
            if !self.auth.refresh().await {
                return Err(MonitorError::AuthExpired);
            }

            bearer_token = self
                .auth
                .bearer_token()
                .await
                .ok_or(MonitorError::AuthMissing)?;
            (status, body) = self
                .api
                .fetch_structures(self.corporation_id, &bearer_token)
                .await
                .map_err(MonitorError::Fetch)?;
        }

        match status {
            200 => {
                let structures =
                    serde_json::from_str(&body).map_err(|e| MonitorError::Parse(e.to_string()))?;
                Ok((bearer_token, structures))
            }
            401 => Err(MonitorError::AuthExpired),
            status => {
                debug!("Error body: {}", body);
                Err(MonitorError::Status(status))
            }
        }
    }

    fn compare(
        &mut self,
        structures: Vec<(EsiStructure, String)>,
        now: DateTime<Utc>,
    ) -> Vec<Alert> {
        let mut alerts = Vec::new();

        for (structure, name) in structures {
            let id = structure.structure_id;
            let (status, fuel_error) = StructureStatus::from_esi(&structure);

            if let Some(error) = fuel_error {
                warn!(
                    "[{}] Ignoring unparseable fuel expiry {:?}: {}",
                    id, structure.fuel_expires, error
                );
            }

            info!(
                "[{}] {}: state={} fuel_expires={} under_attack={} shields={}",
                id,
                name,
                status.state.as_deref().unwrap_or("unknown"),
                status
                    .fuel_expires
                    .map(|f| f.to_rfc3339())
                    .unwrap_or_else(|| "n/a".to_string()),
                status.under_attack,
                status
                    .shield_percentage
                    .map(|s| format!("{:.1}%", s))
                    .unwrap_or_else(|| "n/a".to_string()),
            );

            if status.under_attack {
                alerts.push(Alert::UnderAttack { name: name.clone() });
            }

            /* A first sighting never raises a fuel alert. */
            if let Some(previous) = self.snapshot.get(&id) {
                if status.under_attack && !previous.under_attack {
                    alerts.push(Alert::NewlyUnderAttack { name: name.clone() });
                }

                if let Some(fuel_expires) = status.fuel_expires {
                    if fuel_expires - now < Duration::days(LOW_FUEL_WINDOW_DAYS) {
                        alerts.push(Alert::LowFuel {
                            name,
                            expires: fuel_expires,
                        });
                    }
                }
            }

            self.snapshot.insert(id, status);
        }

        alerts
    }
}
