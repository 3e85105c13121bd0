//! HGM9560 bus-tie / ATS controller, usually behind an RS485 converter.

use super::Decode::*;
use super::{field, Fallback, Field, Label, RegisterBlock, RegisterMap};

const STATUS: &[Field] = &[
    field("mode_test", Bit(0, 8)),
    field("mode_auto", Bit(0, 9)),
    field("mode_manual", Bit(0, 10)),
    field("mode_stop", Bit(0, 11)),
    field("alarm_common", Bit(0, 0)),
    field("alarm_shutdown", Bit(0, 1)),
    field("alarm_warning", Bit(0, 2)),
    field("alarm_trip_stop", Bit(0, 3)),
];

// Sparse: only the words that carry alarm bits.
const ALARM_DETAIL: &[Field] = &[
    field("alarm_reg_00", Raw(0)),
    field("alarm_reg_01", Raw(1)),
    field("alarm_reg_02", Raw(2)),
    field("alarm_reg_08", Raw(8)),
    field("alarm_reg_12", Raw(12)),
    field("alarm_reg_14", Raw(14)),
    field("alarm_reg_16", Raw(16)),
    field("alarm_reg_20", Raw(20)),
    field("alarm_reg_21", Raw(21)),
    field("alarm_reg_24", Raw(24)),
    field("alarm_reg_30", Raw(30)),
    field("alarm_reg_44", Raw(44)),
];

const GENSET_STATUS: &[Field] = &[field("genset_status", Raw(0))];

const MAINS_VOLTAGE: &[Field] = &[
    field("mains_uab", Raw(0)),
    field("mains_ubc", Raw(1)),
    field("mains_uca", Raw(2)),
    field("mains_ua", Raw(3)),
    field("mains_ub", Raw(4)),
    field("mains_uc", Raw(5)),
    field("mains_freq", Scaled(9, 0.01)),
];

const BUSBAR_VOLTAGE: &[Field] = &[
    field("busbar_uab", Raw(0)),
    field("busbar_ubc", Raw(1)),
    field("busbar_uca", Raw(2)),
    field("busbar_ua", Raw(3)),
    field("busbar_ub", Raw(4)),
    field("busbar_uc", Raw(5)),
    field("busbar_freq", Scaled(9, 0.01)),
];

const MAINS_CURRENT: &[Field] = &[
    field("mains_ia", Scaled(0, 0.1)),
    field("mains_ib", Scaled(1, 0.1)),
    field("mains_ic", Scaled(2, 0.1)),
];

const MAINS_POWER: &[Field] = &[
    field("mains_total_p", SignedWide(0, 0.1)),
    field("mains_total_q", SignedWide(8, 0.1)),
];

const BUSBAR_MISC: &[Field] = &[
    field("busbar_current", Scaled(0, 0.1)),
    field("battery_v", Scaled(8, 0.1)),
];

const BUSBAR_POWER: &[Field] = &[
    field("busbar_p", SignedWide(0, 0.1)),
    field("busbar_q", SignedWide(2, 0.1)),
    field("busbar_switch", Raw(11)),
    field("mains_status", Raw(13)),
    field("mains_switch", Raw(15)),
];

const ACCUMULATED: &[Field] = &[
    field("accum_kwh", SignedWide(0, 0.1)),
    field("accum_kvarh", SignedWide(2, 0.1)),
    field("maint_hours", Raw(8)),
];

const GENSET: &[(i64, &str)] = &[
    (0, "standby"),
    (1, "preheat"),
    (2, "fuel_output"),
    (3, "crank"),
    (4, "crank_rest"),
    (5, "safety_run"),
    (6, "start_idle"),
    (7, "warming_up"),
    (8, "wait_load"),
    (9, "running"),
    (10, "cooling"),
    (11, "stop_idle"),
    (12, "ets"),
    (13, "wait_stop"),
    (14, "stop_failure"),
];

const SWITCH: &[(i64, &str)] = &[
    (0, "synchronizing"),
    (1, "close_delay"),
    (2, "wait_closing"),
    (3, "closed"),
    (4, "unloading"),
    (5, "open_delay"),
    (6, "wait_opening"),
    (7, "opened"),
];

const MAINS: &[(i64, &str)] = &[
    (0, "normal"),
    (1, "normal_delay"),
    (2, "abnormal"),
    (3, "abnormal_delay"),
];

pub static MAP: RegisterMap = RegisterMap {
    name: "HGM9560",
    blocks: &[
        RegisterBlock { name: "status", address: 0, count: 3, fields: STATUS },
        RegisterBlock { name: "alarm_detail", address: 0, count: 45, fields: ALARM_DETAIL },
        RegisterBlock { name: "genset_status", address: 40, count: 3, fields: GENSET_STATUS },
        RegisterBlock { name: "mains_voltage", address: 55, count: 10, fields: MAINS_VOLTAGE },
        RegisterBlock { name: "busbar_voltage", address: 75, count: 10, fields: BUSBAR_VOLTAGE },
        RegisterBlock { name: "mains_current", address: 95, count: 3, fields: MAINS_CURRENT },
        RegisterBlock { name: "mains_power", address: 109, count: 10, fields: MAINS_POWER },
        RegisterBlock { name: "busbar_misc", address: 134, count: 12, fields: BUSBAR_MISC },
        RegisterBlock { name: "busbar_power", address: 182, count: 17, fields: BUSBAR_POWER },
        RegisterBlock { name: "accumulated", address: 203, count: 9, fields: ACCUMULATED },
    ],
    labels: &[
        Label {
            source: "genset_status",
            target: "genset_status_text",
            table: GENSET,
            fallback: Fallback::UnknownCode,
        },
        Label {
            source: "busbar_switch",
            target: "busbar_switch_text",
            table: SWITCH,
            fallback: Fallback::Unknown,
        },
        Label {
            source: "mains_switch",
            target: "mains_switch_text",
            table: SWITCH,
            fallback: Fallback::Unknown,
        },
        Label {
            source: "mains_status",
            target: "mains_status_text",
            table: MAINS,
            fallback: Fallback::Unknown,
        },
    ],
};
