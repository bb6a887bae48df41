//! Shell command parsing and execution.
//!
//! One line of input maps to one engine operation. Room names are free-form
//! single words, device ids are the integers the engine printed when the
//! device was added.

use std::fmt::Write as _;
use std::str::FromStr;

use homecircuit_adapter_storage_json::JsonSnapshotStore;
use homecircuit_app::engine::CircuitEngine;
use homecircuit_app::ports::{EventPublisher, SnapshotStore};
use homecircuit_domain::device::{DeviceKind, UnknownKindError};
use homecircuit_domain::error::CircuitError;
use homecircuit_domain::id::{DeviceId, RoomId};

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add { room: RoomId, kind: DeviceKind },
    Remove { room: RoomId, id: DeviceId },
    Connect { room: RoomId, a: DeviceId, b: DeviceId },
    Disconnect { room: RoomId, a: DeviceId, b: DeviceId },
    Plug { room: RoomId, id: DeviceId, connected: bool },
    Source { room: RoomId, action: SourceAction },
    Move { room: RoomId, id: DeviceId, x: i32, y: i32 },
    Temperature(i32),
    Touch { room: RoomId },
    Rooms,
    Devices { room: RoomId },
    Loop { room: RoomId },
    Heat,
    Save,
    Load,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceAction {
    On,
    Off,
    Toggle,
}

/// A line that could not be understood.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command '{0}', try 'help'")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("'{0}' is not a valid device id")]
    InvalidId(String),

    #[error("'{0}' is not a number")]
    InvalidNumber(String),

    #[error(transparent)]
    UnknownKind(#[from] UnknownKindError),
}

fn device_id(token: &str) -> Result<DeviceId, ParseError> {
    DeviceId::from_str(token).map_err(|_| ParseError::InvalidId(token.to_string()))
}

fn number(token: &str) -> Result<i32, ParseError> {
    token
        .parse()
        .map_err(|_| ParseError::InvalidNumber(token.to_string()))
}

impl Command {
    /// Parse one trimmed, non-empty input line.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] describing the first problem found.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["add", room, kind] => Ok(Self::Add {
                room: RoomId::new(*room),
                kind: kind.parse()?,
            }),
            ["add", ..] => Err(ParseError::Usage("add <room> <kind>")),
            ["remove", room, id] => Ok(Self::Remove {
                room: RoomId::new(*room),
                id: device_id(id)?,
            }),
            ["remove", ..] => Err(ParseError::Usage("remove <room> <id>")),
            ["connect", room, a, b] => Ok(Self::Connect {
                room: RoomId::new(*room),
                a: device_id(a)?,
                b: device_id(b)?,
            }),
            ["connect", ..] => Err(ParseError::Usage("connect <room> <id> <id>")),
            ["disconnect", room, a, b] => Ok(Self::Disconnect {
                room: RoomId::new(*room),
                a: device_id(a)?,
                b: device_id(b)?,
            }),
            ["disconnect", ..] => Err(ParseError::Usage("disconnect <room> <id> <id>")),
            ["plug", room, id] => Ok(Self::Plug {
                room: RoomId::new(*room),
                id: device_id(id)?,
                connected: true,
            }),
            ["unplug", room, id] => Ok(Self::Plug {
                room: RoomId::new(*room),
                id: device_id(id)?,
                connected: false,
            }),
            ["plug" | "unplug", ..] => Err(ParseError::Usage("plug|unplug <room> <id>")),
            ["source", room, action] => {
                let action = match *action {
                    "on" => SourceAction::On,
                    "off" => SourceAction::Off,
                    "toggle" => SourceAction::Toggle,
                    _ => return Err(ParseError::Usage("source <room> on|off|toggle")),
                };
                Ok(Self::Source {
                    room: RoomId::new(*room),
                    action,
                })
            }
            ["source", ..] => Err(ParseError::Usage("source <room> on|off|toggle")),
            ["move", room, id, x, y] => Ok(Self::Move {
                room: RoomId::new(*room),
                id: device_id(id)?,
                x: number(x)?,
                y: number(y)?,
            }),
            ["move", ..] => Err(ParseError::Usage("move <room> <id> <x> <y>")),
            ["temp", celsius] => Ok(Self::Temperature(number(celsius)?)),
            ["temp", ..] => Err(ParseError::Usage("temp <celsius>")),
            ["touch", room] => Ok(Self::Touch {
                room: RoomId::new(*room),
            }),
            ["touch", ..] => Err(ParseError::Usage("touch <room>")),
            ["rooms"] => Ok(Self::Rooms),
            ["devices", room] => Ok(Self::Devices {
                room: RoomId::new(*room),
            }),
            ["devices", ..] => Err(ParseError::Usage("devices <room>")),
            ["loop", room] => Ok(Self::Loop {
                room: RoomId::new(*room),
            }),
            ["loop", ..] => Err(ParseError::Usage("loop <room>")),
            ["heat"] => Ok(Self::Heat),
            ["save"] => Ok(Self::Save),
            ["load"] => Ok(Self::Load),
            ["help"] => Ok(Self::Help),
            ["quit" | "exit"] => Ok(Self::Quit),
            [first, ..] => Err(ParseError::UnknownCommand((*first).to_string())),
            [] => Err(ParseError::UnknownCommand(String::new())),
        }
    }
}

const HELP: &str = "\
commands:
  add <room> <kind>           place a device (lamp, bulb, desk-lamp, tv,
                              radio, computer, heat, motion, source)
  remove <room> <id>          remove a device and its wires
  connect <room> <id> <id>    wire two devices together
  disconnect <room> <id> <id> cut a wire
  plug <room> <id>            plug a device in
  unplug <room> <id>          unplug a device
  source <room> on|off|toggle switch the room's voltage source
  move <room> <id> <x> <y>    reposition a device
  temp <celsius>              set the installation temperature
  touch <room>                register a user interaction
  rooms                       list rooms
  devices <room>              list a room's devices
  loop <room>                 report whether the wiring contains a loop
  heat                        report the heat alarm state
  save / load                 persist or restore the installation
  quit                        save and leave";

/// Run one command against the engine, returning the text to print.
///
/// # Errors
///
/// Propagates engine and storage errors for the caller to render.
pub async fn execute<P>(
    engine: &CircuitEngine<P>,
    store: &JsonSnapshotStore,
    command: Command,
) -> Result<String, CircuitError>
where
    P: EventPublisher + Send + Sync + 'static,
{
    match command {
        Command::Add { room, kind } => {
            let device = engine.add_device(&room, kind).await?;
            Ok(format!("added {} {} in {room}", kind.label(), device.id))
        }
        Command::Remove { room, id } => {
            engine.remove_device(&room, id).await?;
            Ok(format!("removed device {id} from {room}"))
        }
        Command::Connect { room, a, b } => {
            if engine.connect(&room, a, b).await? {
                Ok(format!("wired {a} — {b}"))
            } else {
                Ok(format!("{a} — {b} were already wired"))
            }
        }
        Command::Disconnect { room, a, b } => {
            if engine.disconnect(&room, a, b).await? {
                Ok(format!("cut {a} — {b}"))
            } else {
                Ok(format!("{a} — {b} were not wired"))
            }
        }
        Command::Plug {
            room,
            id,
            connected,
        } => {
            engine.set_connected(&room, id, connected).await?;
            let verb = if connected { "plugged in" } else { "unplugged" };
            Ok(format!("{verb} device {id}"))
        }
        Command::Source { room, action } => {
            let enabled = match action {
                SourceAction::On => engine.set_source_enabled(&room, true).await?,
                SourceAction::Off => engine.set_source_enabled(&room, false).await?,
                SourceAction::Toggle => engine.toggle_source(&room).await?,
            };
            let state = if enabled { "on" } else { "off" };
            Ok(format!("source in {room} is {state}"))
        }
        Command::Move { room, id, x, y } => {
            engine.set_position(&room, id, x, y).await?;
            Ok(format!("moved device {id} to ({x}, {y})"))
        }
        Command::Temperature(celsius) => {
            engine.set_temperature(celsius).await?;
            Ok(format!("temperature set to {celsius}°C"))
        }
        Command::Touch { room } => {
            engine.register_user_interaction(&room).await?;
            Ok(format!("interaction registered in {room}"))
        }
        Command::Rooms => {
            let rooms = engine.rooms().await;
            if rooms.is_empty() {
                Ok("no rooms yet".to_string())
            } else {
                Ok(rooms
                    .iter()
                    .map(RoomId::to_string)
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
        }
        Command::Devices { room } => {
            let devices = engine.devices(&room).await?;
            let mut out = String::new();
            for device in devices {
                let power = if device.powered_on { "on" } else { "off" };
                let plugged = if device.connected { "" } else { " (unplugged)" };
                let armed = if device.is_armed() { " [armed]" } else { "" };
                let _ = writeln!(
                    out,
                    "{:>4}  {:<14} {power}{plugged}{armed}",
                    device.id.to_string(),
                    device.kind.label(),
                );
            }
            Ok(out.trim_end().to_string())
        }
        Command::Loop { room } => {
            if engine.has_closed_circuit(&room).await? {
                Ok(format!("{room} has a closed circuit"))
            } else {
                Ok(format!("{room} has no closed circuit"))
            }
        }
        Command::Heat => {
            if engine.heat_alarm_active().await {
                Ok("heat alarm is ACTIVE".to_string())
            } else {
                Ok(format!(
                    "heat alarm is clear ({}°C)",
                    engine.temperature().await
                ))
            }
        }
        Command::Save => {
            store.save(&engine.snapshot().await).await?;
            Ok(format!("saved to {}", store.path().display()))
        }
        Command::Load => match store.load().await? {
            Some(snapshot) => {
                engine.load_snapshot(&snapshot).await?;
                Ok(format!("loaded from {}", store.path().display()))
            }
            None => Ok(format!("nothing saved at {}", store.path().display())),
        },
        Command::Help => Ok(HELP.to_string()),
        Command::Quit => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_device_commands() {
        assert_eq!(
            Command::parse("add kitchen motion").unwrap(),
            Command::Add {
                room: RoomId::new("kitchen"),
                kind: DeviceKind::MotionSensor,
            }
        );
        assert_eq!(
            Command::parse("connect kitchen 1 2").unwrap(),
            Command::Connect {
                room: RoomId::new("kitchen"),
                a: DeviceId::new(1).unwrap(),
                b: DeviceId::new(2).unwrap(),
            }
        );
        assert_eq!(
            Command::parse("unplug bedroom 4").unwrap(),
            Command::Plug {
                room: RoomId::new("bedroom"),
                id: DeviceId::new(4).unwrap(),
                connected: false,
            }
        );
        assert_eq!(
            Command::parse("move den 2 15 -3").unwrap(),
            Command::Move {
                room: RoomId::new("den"),
                id: DeviceId::new(2).unwrap(),
                x: 15,
                y: -3,
            }
        );
    }

    #[test]
    fn should_parse_source_actions() {
        assert_eq!(
            Command::parse("source kitchen toggle").unwrap(),
            Command::Source {
                room: RoomId::new("kitchen"),
                action: SourceAction::Toggle,
            }
        );
        assert!(matches!(
            Command::parse("source kitchen sideways"),
            Err(ParseError::Usage(_))
        ));
    }

    #[test]
    fn should_reject_bad_ids_kinds_and_commands() {
        assert!(matches!(
            Command::parse("remove kitchen zero"),
            Err(ParseError::InvalidId(_))
        ));
        assert!(matches!(
            Command::parse("remove kitchen 0"),
            Err(ParseError::InvalidId(_))
        ));
        assert!(matches!(
            Command::parse("add kitchen toaster"),
            Err(ParseError::UnknownKind(_))
        ));
        assert!(matches!(
            Command::parse("launch kitchen"),
            Err(ParseError::UnknownCommand(_))
        ));
        assert!(matches!(
            Command::parse("add kitchen"),
            Err(ParseError::Usage(_))
        ));
    }

    #[test]
    fn should_parse_bare_commands() {
        assert_eq!(Command::parse("rooms").unwrap(), Command::Rooms);
        assert_eq!(Command::parse("heat").unwrap(), Command::Heat);
        assert_eq!(Command::parse("exit").unwrap(), Command::Quit);
        assert_eq!(Command::parse("temp 42").unwrap(), Command::Temperature(42));
    }

    #[tokio::test]
    async fn should_run_a_session_end_to_end() {
        use homecircuit_app::engine::EngineConfig;
        use homecircuit_app::event_bus::InProcessEventBus;

        let dir = tempfile::tempdir().unwrap();
        let store = JsonSnapshotStore::new(dir.path().join("state.json"));
        let bus = std::sync::Arc::new(InProcessEventBus::new(16));
        let engine = CircuitEngine::new(bus, EngineConfig::default());

        for line in [
            "add kitchen source",
            "add kitchen lamp",
            "connect kitchen 1 2",
            "source kitchen on",
            "save",
        ] {
            let command = Command::parse(line).unwrap();
            execute(&engine, &store, command).await.unwrap();
        }

        let report = execute(&engine, &store, Command::parse("devices kitchen").unwrap())
            .await
            .unwrap();
        assert!(report.contains("Lamp"));
        assert!(report.contains("on"));

        // A fresh engine picks the saved state back up.
        let bus = std::sync::Arc::new(InProcessEventBus::new(16));
        let restored = CircuitEngine::new(bus, EngineConfig::default());
        let report = execute(&restored, &store, Command::Load).await.unwrap();
        assert!(report.starts_with("loaded"));
        let report = execute(&restored, &store, Command::Rooms).await.unwrap();
        assert_eq!(report, "kitchen");
    }
}
