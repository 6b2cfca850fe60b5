//! Typed action identifiers for the keybinding system.

/// Macro to generate action enums with string conversion methods
macro_rules! define_action_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident => $str:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )*
        }
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $str, )*
                }
            }
            pub fn from_str(s: &str) -> Option<Self> {
                match s {
                    $( $str => Some($name::$variant), )*
                    _ => None,
                }
            }
        }
    }
}

define_action_enum! {
    /// Global layer actions (available on every pane)
    pub enum GlobalActionId {
        Quit => "quit",
        StartStop => "start_stop",
        Tap => "tap",
        Cancel => "cancel",
        Resync => "resync",
        BpmUp => "bpm_up",
        BpmDown => "bpm_down",
        BpmUpBig => "bpm_up_10",
        BpmDownBig => "bpm_down_10",
        ToggleSteps => "toggle_steps",
        ChannelUp => "channel_up",
        ChannelDown => "channel_down",
        DeviceNext => "device_next",
        DevicePrev => "device_prev",
        Help => "help",
    }
}

define_action_enum! {
    /// Pattern grid pane actions
    pub enum GridActionId {
        Bank1 => "bank_1",
        Bank2 => "bank_2",
        Bank3 => "bank_3",
        Bank4 => "bank_4",
        Slot1 => "slot_1",
        Slot2 => "slot_2",
        Slot3 => "slot_3",
        Slot4 => "slot_4",
        Slot5 => "slot_5",
        Slot6 => "slot_6",
        Slot7 => "slot_7",
        Slot8 => "slot_8",
        Slot9 => "slot_9",
        Slot10 => "slot_10",
        Slot11 => "slot_11",
        Slot12 => "slot_12",
        Slot13 => "slot_13",
        Slot14 => "slot_14",
        Slot15 => "slot_15",
        Slot16 => "slot_16",
        FillAll => "fill_all",
        FillNone => "fill_none",
    }
}

impl GridActionId {
    /// 1-based bank for the bank selectors.
    pub fn bank(self) -> Option<u8> {
        let n = match self {
            GridActionId::Bank1 => 1,
            GridActionId::Bank2 => 2,
            GridActionId::Bank3 => 3,
            GridActionId::Bank4 => 4,
            _ => return None,
        };
        Some(n)
    }

    /// 1-based slot for the slot toggles.
    pub fn slot(self) -> Option<u8> {
        self.as_str()
            .strip_prefix("slot_")
            .and_then(|n| n.parse().ok())
    }
}

define_action_enum! {
    /// Help pane actions
    pub enum HelpActionId {
        Close => "close",
        ScrollUp => "scroll_up",
        ScrollDown => "scroll_down",
    }
}

/// A resolved keybinding action, tagged by the layer that defines it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionId {
    Global(GlobalActionId),
    Grid(GridActionId),
    Help(HelpActionId),
}

impl ActionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionId::Global(a) => a.as_str(),
            ActionId::Grid(a) => a.as_str(),
            ActionId::Help(a) => a.as_str(),
        }
    }
}

/// Resolve an action name within a layer. Unknown layers or names give `None`.
pub fn parse_action_id(layer: &str, action: &str) -> Option<ActionId> {
    match layer {
        "global" => GlobalActionId::from_str(action).map(ActionId::Global),
        "grid" => GridActionId::from_str(action).map(ActionId::Grid),
        "help" => HelpActionId::from_str(action).map(ActionId::Help),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action_id() {
        assert_eq!(
            parse_action_id("global", "start_stop"),
            Some(ActionId::Global(GlobalActionId::StartStop))
        );
        assert_eq!(
            parse_action_id("grid", "slot_16"),
            Some(ActionId::Grid(GridActionId::Slot16))
        );
        assert_eq!(
            parse_action_id("help", "close"),
            Some(ActionId::Help(HelpActionId::Close))
        );
        assert_eq!(parse_action_id("grid", "start_stop"), None);
        assert_eq!(parse_action_id("unknown_layer", "quit"), None);
    }

    #[test]
    fn test_grid_indices() {
        assert_eq!(GridActionId::Bank3.bank(), Some(3));
        assert_eq!(GridActionId::Slot1.bank(), None);
        assert_eq!(GridActionId::Slot12.slot(), Some(12));
        assert_eq!(GridActionId::FillAll.slot(), None);
    }

    #[test]
    fn test_action_id_as_str() {
        assert_eq!(ActionId::Global(GlobalActionId::BpmUpBig).as_str(), "bpm_up_10");
        assert_eq!(ActionId::Grid(GridActionId::FillNone).as_str(), "fill_none");
    }
}
