//! The circuit engine — every mutation and query goes through here.
//!
//! Each mutating operation follows the same sequence: treat the call as a
//! user interaction (an armed motion sensor in the touched room raises the
//! alarm), apply the graph change, re-propagate power in that room, react to
//! sensors gaining or losing power, and finally re-evaluate the heat alarm
//! across the whole installation. Events are published once per actual
//! transition.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use homecircuit_domain::device::{Device, DeviceKind};
use homecircuit_domain::error::{
    CircuitError, DuplicateSourceError, NotFoundError, ValidationError,
};
use homecircuit_domain::event::{Event, EventData};
use homecircuit_domain::id::{DeviceId, RoomId};
use homecircuit_domain::installation::Installation;
use homecircuit_domain::snapshot::InstallationSnapshot;

use crate::cycle::has_closed_circuit;
use crate::ports::EventPublisher;
use crate::power::{heat_alarm_condition, recompute_room};
use crate::sensors::SensorScheduler;

/// Tunables for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a motion sensor must stay powered before it arms.
    pub arming_delay: Duration,
    /// Heat-alarm threshold in °C; the alarm needs strictly more.
    pub heat_threshold: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            arming_delay: Duration::from_millis(3000),
            heat_threshold: 40,
        }
    }
}

struct EngineState {
    installation: Installation,
    heat_alarm: bool,
}

struct EngineInner<P> {
    state: Mutex<EngineState>,
    scheduler: SensorScheduler,
    publisher: P,
    config: EngineConfig,
}

/// Thread-safe handle to one household installation.
///
/// Cheap to clone; all clones share the same installation.
pub struct CircuitEngine<P> {
    inner: Arc<EngineInner<P>>,
}

impl<P> Clone for CircuitEngine<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P> CircuitEngine<P>
where
    P: EventPublisher + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(publisher: P, config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                state: Mutex::new(EngineState {
                    installation: Installation::new(),
                    heat_alarm: false,
                }),
                scheduler: SensorScheduler::new(),
                publisher,
                config,
            }),
        }
    }

    /// Place a new device of `kind` in `room`, creating the room on first
    /// use. The device starts plugged in, unwired, and unpowered.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::DuplicateSource`] when `kind` is a voltage
    /// source and the room already has one, or
    /// [`ValidationError::EmptyRoomName`] for an empty room id.
    #[tracing::instrument(skip(self))]
    pub async fn add_device(&self, room: &RoomId, kind: DeviceKind) -> Result<Device, CircuitError> {
        let mut state = self.inner.state.lock().await;
        self.alarm_on_interaction(&state, room).await?;

        if kind.is_source()
            && state
                .installation
                .room(room)
                .is_ok_and(|r| r.source().is_some())
        {
            return Err(DuplicateSourceError { room: room.clone() }.into());
        }
        state.installation.ensure_room(room)?;
        let id = state.installation.allocate_id();
        let device = state.installation.room_mut(room)?.add_device(id, kind)?;

        self.publish(EventData::DeviceAdded {
            room: room.clone(),
            device: id,
            kind,
        })
        .await?;
        self.sync_room(&mut state, room).await?;
        Ok(device)
    }

    /// Remove a device and every wire touching it, then re-propagate.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::NotFound`] when the room or device is absent.
    #[tracing::instrument(skip(self))]
    pub async fn remove_device(&self, room: &RoomId, id: DeviceId) -> Result<(), CircuitError> {
        let mut state = self.inner.state.lock().await;
        self.alarm_on_interaction(&state, room).await?;

        // Cancel first so a stale timer can never touch the removed device.
        self.inner.scheduler.cancel(id);
        let removed = state.installation.room_mut(room)?.remove_device(id)?;

        self.publish(EventData::DeviceRemoved {
            room: room.clone(),
            device: id,
            kind: removed.kind,
        })
        .await?;
        self.sync_room(&mut state, room).await?;
        Ok(())
    }

    /// Move a device on the room's floor plan.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::NotFound`] when the room or device is absent.
    #[tracing::instrument(skip(self))]
    pub async fn set_position(
        &self,
        room: &RoomId,
        id: DeviceId,
        x: i32,
        y: i32,
    ) -> Result<(), CircuitError> {
        let mut state = self.inner.state.lock().await;
        self.alarm_on_interaction(&state, room).await?;

        let device = device_mut(&mut state.installation, room, id)?;
        device.x = x;
        device.y = y;
        Ok(())
    }

    /// Wire two devices together. Returns whether a new wire was inserted
    /// (`false` when the pair was already wired, in either orientation).
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::InvalidConnection`] on a self-loop or an
    /// absent endpoint, [`CircuitError::NotFound`] for an unknown room.
    #[tracing::instrument(skip(self))]
    pub async fn connect(
        &self,
        room: &RoomId,
        a: DeviceId,
        b: DeviceId,
    ) -> Result<bool, CircuitError> {
        let mut state = self.inner.state.lock().await;
        self.alarm_on_interaction(&state, room).await?;

        let room_ref = state.installation.room_mut(room)?;
        let had_loop = has_closed_circuit(room_ref);
        let inserted = room_ref.connect(a, b)?;
        if inserted {
            self.publish(EventData::WireConnected {
                room: room.clone(),
                origin: a,
                dest: b,
            })
            .await?;
            if !had_loop && has_closed_circuit(state.installation.room(room)?) {
                self.publish(EventData::ClosedCircuit { room: room.clone() })
                    .await?;
            }
            self.sync_room(&mut state, room).await?;
        }
        Ok(inserted)
    }

    /// Remove the wire between two devices. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::NotFound`] for an unknown room.
    #[tracing::instrument(skip(self))]
    pub async fn disconnect(
        &self,
        room: &RoomId,
        a: DeviceId,
        b: DeviceId,
    ) -> Result<bool, CircuitError> {
        let mut state = self.inner.state.lock().await;
        self.alarm_on_interaction(&state, room).await?;

        let removed = state.installation.room_mut(room)?.disconnect(a, b);
        if removed {
            self.publish(EventData::WireDisconnected {
                room: room.clone(),
                origin: a,
                dest: b,
            })
            .await?;
            self.sync_room(&mut state, room).await?;
        }
        Ok(removed)
    }

    /// Plug a device in or unplug it. Unplugging clears its power (a source
    /// loses its switch position too) and stops it conducting.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::NotFound`] when the room or device is absent.
    #[tracing::instrument(skip(self))]
    pub async fn set_connected(
        &self,
        room: &RoomId,
        id: DeviceId,
        connected: bool,
    ) -> Result<(), CircuitError> {
        let mut state = self.inner.state.lock().await;
        self.alarm_on_interaction(&state, room).await?;

        let device = device_mut(&mut state.installation, room, id)?;
        if device.connected == connected {
            return Ok(());
        }
        device.connected = connected;
        if !connected && device.kind.is_source() && device.powered_on {
            device.powered_on = false;
            self.publish(EventData::PowerChanged {
                room: room.clone(),
                device: id,
                kind: DeviceKind::VoltageSource,
                powered_on: false,
            })
            .await?;
        }
        self.sync_room(&mut state, room).await?;
        Ok(())
    }

    /// Switch the room's voltage source on or off. Returns the new state.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::NotFound`] when the room has no source, or
    /// [`ValidationError::PoweredWhileDisconnected`] when enabling an
    /// unplugged source.
    #[tracing::instrument(skip(self))]
    pub async fn set_source_enabled(
        &self,
        room: &RoomId,
        enabled: bool,
    ) -> Result<bool, CircuitError> {
        let mut state = self.inner.state.lock().await;
        self.alarm_on_interaction(&state, room).await?;
        self.switch_source(&mut state, room, enabled).await
    }

    /// Flip the room's voltage source. Returns the new state.
    ///
    /// # Errors
    ///
    /// Same contract as [`set_source_enabled`](Self::set_source_enabled).
    #[tracing::instrument(skip(self))]
    pub async fn toggle_source(&self, room: &RoomId) -> Result<bool, CircuitError> {
        let mut state = self.inner.state.lock().await;
        self.alarm_on_interaction(&state, room).await?;

        let enabled = match state.installation.room(room)?.source() {
            Some(source) => !source.powered_on,
            None => {
                return Err(NotFoundError {
                    entity: "VoltageSource",
                    id: room.to_string(),
                }
                .into());
            }
        };
        self.switch_source(&mut state, room, enabled).await
    }

    /// Move the source switch under an already-held state lock.
    async fn switch_source(
        &self,
        state: &mut EngineState,
        room: &RoomId,
        enabled: bool,
    ) -> Result<bool, CircuitError> {
        let room_ref = state.installation.room_mut(room)?;
        let Some(source) = room_ref.source() else {
            return Err(NotFoundError {
                entity: "VoltageSource",
                id: room.to_string(),
            }
            .into());
        };
        if enabled && !source.connected {
            return Err(ValidationError::PoweredWhileDisconnected(source.id).into());
        }
        let (source_id, changed) = (source.id, source.powered_on != enabled);
        if changed {
            if let Some(device) = room_ref.device_mut(source_id) {
                device.powered_on = enabled;
            }
            self.publish(EventData::PowerChanged {
                room: room.clone(),
                device: source_id,
                kind: DeviceKind::VoltageSource,
                powered_on: enabled,
            })
            .await?;
            self.sync_room(state, room).await?;
        }
        Ok(enabled)
    }

    /// Set the installation-wide temperature and re-evaluate the heat alarm.
    ///
    /// # Errors
    ///
    /// Propagates publisher failures.
    #[tracing::instrument(skip(self))]
    pub async fn set_temperature(&self, celsius: i32) -> Result<(), CircuitError> {
        let mut state = self.inner.state.lock().await;
        if state.installation.temperature() == celsius {
            return Ok(());
        }
        state.installation.set_temperature(celsius);
        self.publish(EventData::TemperatureChanged { celsius }).await?;
        self.sync_heat_alarm(&mut state).await
    }

    /// Record a user interaction in `room`; an armed motion sensor there
    /// raises the alarm.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::NotFound`] for an unknown room.
    #[tracing::instrument(skip(self))]
    pub async fn register_user_interaction(&self, room: &RoomId) -> Result<(), CircuitError> {
        let state = self.inner.state.lock().await;
        state.installation.room(room)?;
        self.alarm_on_interaction(&state, room).await
    }

    /// Whether the room's wiring currently contains a loop.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::NotFound`] for an unknown room.
    pub async fn has_closed_circuit(&self, room: &RoomId) -> Result<bool, CircuitError> {
        let state = self.inner.state.lock().await;
        Ok(has_closed_circuit(state.installation.room(room)?))
    }

    /// Whether the heat alarm is currently raised.
    pub async fn heat_alarm_active(&self) -> bool {
        self.inner.state.lock().await.heat_alarm
    }

    /// Current installation-wide temperature in °C.
    pub async fn temperature(&self) -> i32 {
        self.inner.state.lock().await.installation.temperature()
    }

    /// Room ids in order.
    pub async fn rooms(&self) -> Vec<RoomId> {
        let state = self.inner.state.lock().await;
        state
            .installation
            .rooms()
            .map(|room| room.id().clone())
            .collect()
    }

    /// All devices of a room, in ascending id order.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::NotFound`] for an unknown room.
    pub async fn devices(&self, room: &RoomId) -> Result<Vec<Device>, CircuitError> {
        let state = self.inner.state.lock().await;
        Ok(state.installation.room(room)?.devices().cloned().collect())
    }

    /// Look up one device.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::NotFound`] when the room or device is absent.
    pub async fn device(&self, room: &RoomId, id: DeviceId) -> Result<Device, CircuitError> {
        let state = self.inner.state.lock().await;
        match state.installation.room(room)?.device(id) {
            Some(device) => Ok(device.clone()),
            None => Err(NotFoundError {
                entity: "Device",
                id: id.to_string(),
            }
            .into()),
        }
    }

    /// Export the current installation state.
    pub async fn snapshot(&self) -> InstallationSnapshot {
        self.inner.state.lock().await.installation.to_snapshot()
    }

    /// Replace the whole installation with a persisted snapshot.
    ///
    /// Pending arming timers are dropped, power is re-propagated in every
    /// room, sensors whose persisted armed state is not backed by power are
    /// disarmed, powered-but-unarmed sensors restart their arming delay, and
    /// the heat alarm is re-evaluated from scratch.
    ///
    /// # Errors
    ///
    /// Propagates publisher failures.
    #[tracing::instrument(skip(self, snapshot))]
    pub async fn load_snapshot(&self, snapshot: &InstallationSnapshot) -> Result<(), CircuitError> {
        let mut state = self.inner.state.lock().await;
        self.inner.scheduler.cancel_all();

        state.installation = Installation::from_snapshot(snapshot);
        state.heat_alarm = false;

        let rooms: Vec<RoomId> = state
            .installation
            .rooms()
            .map(|room| room.id().clone())
            .collect();
        for room in &rooms {
            recompute_room(state.installation.room_mut(room)?);
            let mut stale: Vec<DeviceId> = Vec::new();
            let mut waiting: Vec<DeviceId> = Vec::new();
            for device in state.installation.room(room)?.devices() {
                if device.kind != DeviceKind::MotionSensor {
                    continue;
                }
                if device.is_armed() && !device.powered_on {
                    stale.push(device.id);
                } else if device.connected && device.powered_on && device.armed == Some(false) {
                    waiting.push(device.id);
                }
            }
            // A snapshot may claim an armed sensor whose power does not
            // survive recomputation (no active source, dropped wire).
            for sensor in stale {
                tracing::warn!(%room, sensor = %sensor, "disarming restored sensor without power");
                device_mut(&mut state.installation, room, sensor)?.armed = Some(false);
            }
            for sensor in waiting {
                self.start_arming(room, sensor).await?;
            }
        }
        self.sync_heat_alarm(&mut state).await
    }

    /// Re-propagate one room and follow up on the consequences.
    async fn sync_room(
        &self,
        state: &mut EngineState,
        room: &RoomId,
    ) -> Result<(), CircuitError> {
        let changed = recompute_room(state.installation.room_mut(room)?);
        for id in &changed {
            let Some(device) = state.installation.room(room)?.device(*id) else {
                continue;
            };
            self.publish(EventData::PowerChanged {
                room: room.clone(),
                device: device.id,
                kind: device.kind,
                powered_on: device.powered_on,
            })
            .await?;
        }

        for id in changed {
            let Some(device) = state.installation.room(room)?.device(id) else {
                continue;
            };
            if device.kind != DeviceKind::MotionSensor {
                continue;
            }
            let (powered, was_armed) = (device.powered_on, device.is_armed());
            if powered {
                self.start_arming(room, id).await?;
            } else {
                self.inner.scheduler.cancel(id);
                if was_armed {
                    device_mut(&mut state.installation, room, id)?.armed = Some(false);
                    self.publish(EventData::SensorDisarmed {
                        room: room.clone(),
                        device: id,
                    })
                    .await?;
                }
            }
        }

        self.sync_heat_alarm(state).await
    }

    /// Publish `SensorArming` and start the single-shot timer.
    async fn start_arming(&self, room: &RoomId, sensor: DeviceId) -> Result<(), CircuitError> {
        let engine = self.clone();
        let room = room.clone();
        let delay = self.inner.config.arming_delay;
        let publish_room = room.clone();
        let started = self.inner.scheduler.schedule(sensor, delay, async move {
            if let Err(error) = engine.arm_sensor(&room, sensor).await {
                tracing::warn!(?error, %room, sensor = %sensor, "arming callback failed");
            }
        });
        if started {
            self.publish(EventData::SensorArming {
                room: publish_room,
                device: sensor,
            })
            .await?;
        }
        Ok(())
    }

    /// Timer callback: arm the sensor if it is still powered.
    async fn arm_sensor(&self, room: &RoomId, sensor: DeviceId) -> Result<(), CircuitError> {
        let mut state = self.inner.state.lock().await;
        let Ok(Some(device)) = state
            .installation
            .room_mut(room)
            .map(|r| r.device_mut(sensor))
        else {
            return Ok(());
        };
        if device.kind != DeviceKind::MotionSensor
            || !device.connected
            || !device.powered_on
            || device.armed != Some(false)
        {
            return Ok(());
        }
        device.armed = Some(true);
        self.publish(EventData::SensorArmed {
            room: room.clone(),
            device: sensor,
        })
        .await
    }

    async fn sync_heat_alarm(&self, state: &mut EngineState) -> Result<(), CircuitError> {
        let active = heat_alarm_condition(&state.installation, self.inner.config.heat_threshold);
        if active != state.heat_alarm {
            state.heat_alarm = active;
            self.publish(EventData::HeatAlarmChanged { active }).await?;
        }
        Ok(())
    }

    async fn alarm_on_interaction(
        &self,
        state: &EngineState,
        room: &RoomId,
    ) -> Result<(), CircuitError> {
        let tripped = state
            .installation
            .room(room)
            .is_ok_and(|r| r.devices().any(Device::is_armed));
        if tripped {
            self.publish(EventData::AlarmTriggered { room: room.clone() })
                .await?;
        }
        Ok(())
    }

    async fn publish(&self, data: EventData) -> Result<(), CircuitError> {
        self.inner.publisher.publish(Event::new(data)).await
    }
}

fn device_mut<'a>(
    installation: &'a mut Installation,
    room: &RoomId,
    id: DeviceId,
) -> Result<&'a mut Device, CircuitError> {
    installation
        .room_mut(room)?
        .device_mut(id)
        .ok_or_else(|| {
            NotFoundError {
                entity: "Device",
                id: id.to_string(),
            }
            .into()
        })
}
