//! HGM9520N genset controller, Modbus TCP.

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
    field("alarm_block", Bit(0, 7)),
];

// Alarm detail words: shutdown, trip-and-stop, trip, block, warning; six each.
const ALARM_DETAIL: &[Field] = &[
    field("alarm_sd_0", Raw(0)),
    field("alarm_sd_1", Raw(1)),
    field("alarm_sd_2", Raw(2)),
    field("alarm_sd_3", Raw(3)),
    field("alarm_sd_4", Raw(4)),
    field("alarm_sd_5", Raw(5)),
    field("alarm_ts_0", Raw(6)),
    field("alarm_ts_1", Raw(7)),
    field("alarm_ts_2", Raw(8)),
    field("alarm_ts_3", Raw(9)),
    field("alarm_ts_4", Raw(10)),
    field("alarm_ts_5", Raw(11)),
    field("alarm_tr_0", Raw(12)),
    field("alarm_tr_1", Raw(13)),
    field("alarm_tr_2", Raw(14)),
    field("alarm_tr_3", Raw(15)),
    field("alarm_tr_4", Raw(16)),
    field("alarm_tr_5", Raw(17)),
    field("alarm_bk_0", Raw(18)),
    field("alarm_bk_1", Raw(19)),
    field("alarm_bk_2", Raw(20)),
    field("alarm_bk_3", Raw(21)),
    field("alarm_bk_4", Raw(22)),
    field("alarm_bk_5", Raw(23)),
    field("alarm_wn_0", Raw(24)),
    field("alarm_wn_1", Raw(25)),
    field("alarm_wn_2", Raw(26)),
    field("alarm_wn_3", Raw(27)),
    field("alarm_wn_4", Raw(28)),
    field("alarm_wn_5", Raw(29)),
];

const BREAKER: &[Field] = &[
    field("mains_normal", Bit(0, 0)),
    field("mains_load", Bit(0, 1)),
    field("gen_normal", Bit(0, 2)),
    field("gen_closed", Bit(0, 3)),
];

const MAINS_VOLTAGE: &[Field] = &[
    field("mains_uab", Wide(0, 0.1)),
    field("mains_ubc", Wide(2, 0.1)),
    field("mains_uca", Wide(4, 0.1)),
    field("mains_freq", Scaled(15, 0.01)),
];

const GEN_VOLTAGE: &[Field] = &[
    field("gen_uab", Wide(0, 0.1)),
    field("gen_ubc", Wide(2, 0.1)),
    field("gen_uca", Wide(4, 0.1)),
    field("gen_freq", Scaled(15, 0.01)),
    field("volt_diff", Signed(16, 0.1)),
    field("freq_diff", Signed(17, 0.01)),
    field("phase_diff", Signed(18, 0.1)),
];

const GEN_CURRENT: &[Field] = &[
    field("current_a", Measured(0, 0.1)),
    field("current_b", Measured(1, 0.1)),
    field("current_c", Measured(2, 0.1)),
    field("current_earth", Measured(3, 0.1)),
];

const POWER: &[Field] = &[
    field("power_a", SignedWide(0, 0.1)),
    field("power_b", SignedWide(2, 0.1)),
    field("power_c", SignedWide(4, 0.1)),
    field("power_total", SignedWide(6, 0.1)),
    field("reactive_a", SignedWide(8, 0.1)),
    field("reactive_b", SignedWide(10, 0.1)),
    field("reactive_c", SignedWide(12, 0.1)),
    field("reactive_total", SignedWide(14, 0.1)),
    field("pf_a", Signed(24, 0.001)),
    field("pf_b", Signed(25, 0.001)),
    field("pf_c", Signed(26, 0.001)),
    field("pf_avg", Signed(27, 0.001)),
];

const ENGINE: &[Field] = &[
    field("engine_speed", Bounded(0, 5000, 1.0)),
    field("battery_volt", Measured(1, 0.1)),
    field("charger_volt", Measured(2, 0.1)),
    field("coolant_temp", Temperature(8)),
    field("oil_pressure", Bounded(10, 9999, 1.0)),
    field("fuel_level", Bounded(12, 100, 1.0)),
    field("load_pct", Load(20)),
    field("oil_temp", Temperature(22)),
    field("fuel_pressure", Bounded(24, 9999, 1.0)),
    field("turbo_pressure", Bounded(28, 9999, 1.0)),
    field("fuel_consumption", Bounded(29, 10000, 0.1)),
];

const ACCUMULATED: &[Field] = &[
    field("gen_status", Raw(0)),
    field("run_hours", Raw(10)),
    field("run_minutes", Raw(11)),
    field("start_count", Raw(13)),
    field("energy_kwh", Wide(14, 1.0)),
];

const ALARMS: &[Field] = &[field("alarm_count", Raw(0))];

const GEN_STATUS: &[(i64, &str)] = &[
    (0, "standby"),
    (1, "preheat"),
    (2, "fuel_on"),
    (3, "cranking"),
    (4, "crank_rest"),
    (5, "safety_run"),
    (6, "idle"),
    (7, "warming"),
    (8, "wait_load"),
    (9, "running"),
    (10, "cooling"),
    (11, "idle_stop"),
    (12, "ets"),
    (13, "wait_stop"),
    (14, "post_stop"),
    (15, "stop_failure"),
];

pub static MAP: RegisterMap = RegisterMap {
    name: "HGM9520N",
    blocks: &[
        RegisterBlock { name: "status", address: 0, count: 1, fields: STATUS },
        RegisterBlock { name: "alarm_detail", address: 1, count: 30, fields: ALARM_DETAIL },
        RegisterBlock { name: "breaker", address: 114, count: 1, fields: BREAKER },
        RegisterBlock { name: "mains_voltage", address: 120, count: 16, fields: MAINS_VOLTAGE },
        RegisterBlock { name: "gen_voltage", address: 140, count: 19, fields: GEN_VOLTAGE },
        RegisterBlock { name: "gen_current", address: 166, count: 8, fields: GEN_CURRENT },
        RegisterBlock { name: "power", address: 174, count: 28, fields: POWER },
        RegisterBlock { name: "engine", address: 212, count: 30, fields: ENGINE },
        RegisterBlock { name: "accumulated", address: 260, count: 16, fields: ACCUMULATED },
        RegisterBlock { name: "alarms", address: 511, count: 1, fields: ALARMS },
    ],
    labels: &[Label {
        source: "gen_status",
        target: "gen_status_text",
        table: GEN_STATUS,
        fallback: Fallback::UnknownCode,
    }],
};
