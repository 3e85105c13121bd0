//! Alarm bit tables for both controller families.

use super::Severity::*;
use super::{AlarmDefinition, AlarmTable, Severity};

const fn def(
    field: &'static str,
    bit: u8,
    code: &'static str,
    name: &'static str,
    severity: Severity,
) -> AlarmDefinition {
    AlarmDefinition {
        field,
        bit,
        code,
        name,
        severity,
    }
}

// HGM9520N {{{
const HGM9520N_DEFINITIONS: &[AlarmDefinition] = &[
    def("alarm_sd_0", 0, "G_SD_0_0", "Emergency Stop Alarm", Shutdown),
    def("alarm_sd_0", 1, "G_SD_0_1", "Overspeed Alarm", Shutdown),
    def("alarm_sd_0", 2, "G_SD_0_2", "Underspeed Alarm", Shutdown),
    def("alarm_sd_0", 3, "G_SD_0_3", "Speed Signal Loss", Shutdown),
    def("alarm_sd_0", 4, "G_SD_0_4", "Gen Overfrequency", Shutdown),
    def("alarm_sd_0", 5, "G_SD_0_5", "Gen Underfrequency", Shutdown),
    def("alarm_sd_0", 6, "G_SD_0_6", "Gen Overvoltage", Shutdown),
    def("alarm_sd_0", 7, "G_SD_0_7", "Gen Undervoltage", Shutdown),
    def("alarm_sd_0", 8, "G_SD_0_8", "Crank Failure Alarm", Shutdown),
    def("alarm_sd_0", 9, "G_SD_0_9", "Gen Overcurrent", Shutdown),
    def("alarm_sd_0", 10, "G_SD_0_10", "Current Imbalance", Shutdown),
    def("alarm_sd_0", 11, "G_SD_0_11", "Earth Fault", Shutdown),
    def("alarm_sd_0", 12, "G_SD_0_12", "Reverse Power Alarm", Shutdown),
    def("alarm_sd_0", 13, "G_SD_0_13", "Over Power Alarm", Shutdown),
    def("alarm_sd_0", 14, "G_SD_0_14", "Loss of Excitation Fault", Shutdown),
    def("alarm_sd_0", 15, "G_SD_0_15", "ECU Communication Failure", Shutdown),
    def("alarm_sd_1", 0, "G_SD_1_0", "ECU Alarm", Shutdown),
    def("alarm_sd_1", 1, "G_SD_1_1", "High Temp. Input Alarm", Shutdown),
    def("alarm_sd_1", 2, "G_SD_1_2", "Low Oil Pressure Input Alarm", Shutdown),
    def("alarm_sd_1", 3, "G_SD_1_3", "MSC ID Error", Shutdown),
    def("alarm_sd_1", 4, "G_SD_1_4", "Voltage Bus Error", Shutdown),
    def("alarm_sd_1", 5, "G_SD_1_5", "Gen Phase Sequence Error", Shutdown),
    def("alarm_sd_1", 6, "G_SD_1_6", "Voltage Bus Phase Sequence Error", Shutdown),
    def("alarm_sd_1", 7, "G_SD_1_7", "Temp. Sensor Open", Shutdown),
    def("alarm_sd_1", 8, "G_SD_1_8", "High Engine Temp.", Shutdown),
    def("alarm_sd_1", 9, "G_SD_1_9", "Low Engine Temp.", Shutdown),
    def("alarm_sd_1", 10, "G_SD_1_10", "Temp. Sensor Error", Shutdown),
    def("alarm_sd_1", 11, "G_SD_1_11", "Oil Pressure Sensor Open", Shutdown),
    def("alarm_sd_1", 12, "G_SD_1_12", "High Oil Pressure", Shutdown),
    def("alarm_sd_1", 13, "G_SD_1_13", "Low Oil Pressure", Shutdown),
    def("alarm_sd_1", 14, "G_SD_1_14", "Oil Pressure Sensor Error", Shutdown),
    def("alarm_sd_1", 15, "G_SD_1_15", "Fuel Level Sensor Open", Shutdown),
    def("alarm_sd_2", 0, "G_SD_2_0", "High Fuel Level", Shutdown),
    def("alarm_sd_2", 1, "G_SD_2_1", "Low Fuel Level", Shutdown),
    def("alarm_sd_2", 2, "G_SD_2_2", "Fuel Level Sensor Error", Shutdown),
    def("alarm_sd_2", 3, "G_SD_2_3", "Aux. Sensor 1 Open", Shutdown),
    def("alarm_sd_2", 4, "G_SD_2_4", "Aux. Sensor 1 High", Shutdown),
    def("alarm_sd_2", 5, "G_SD_2_5", "Aux. Sensor 1 Low", Shutdown),
    def("alarm_sd_2", 6, "G_SD_2_6", "Aux. Sensor 1 Error", Shutdown),
    def("alarm_sd_2", 7, "G_SD_2_7", "Aux. Sensor 2 Open", Shutdown),
    def("alarm_sd_2", 11, "G_SD_2_11", "Stop Failure", Shutdown),
    def("alarm_sd_2", 12, "G_SD_2_12", "Charging Failure", Shutdown),
    def("alarm_sd_2", 13, "G_SD_2_13", "Battery Overvoltage", Shutdown),
    def("alarm_sd_2", 14, "G_SD_2_14", "Battery Undervoltage", Shutdown),
    def("alarm_sd_2", 15, "G_SD_2_15", "Synchronization Failure", Shutdown),
    def("alarm_sd_3", 0, "G_SD_3_0", "GOV Reach Limit", Shutdown),
    def("alarm_sd_3", 1, "G_SD_3_1", "AVR Reach Limit", Shutdown),
    def("alarm_sd_3", 2, "G_SD_3_2", "Gen Insufficient Capacity", Shutdown),
    def("alarm_sd_3", 3, "G_SD_3_3", "Voltage Out of Synchronization", Shutdown),
    def("alarm_sd_3", 4, "G_SD_3_4", "Frequency Out of Synchronization", Shutdown),
    def("alarm_sd_3", 5, "G_SD_3_5", "Phase Out of Synchronization", Shutdown),
    def("alarm_sd_3", 6, "G_SD_3_6", "Mains Breaker Alarm", Shutdown),
    def("alarm_sd_3", 7, "G_SD_3_7", "Gen Breaker Alarm", Shutdown),
    def("alarm_sd_3", 8, "G_SD_3_8", "Mains Close Failure", Shutdown),
    def("alarm_sd_3", 9, "G_SD_3_9", "Gen Close Failure", Shutdown),
    def("alarm_sd_3", 10, "G_SD_3_10", "Mains Open Failure", Shutdown),
    def("alarm_sd_3", 11, "G_SD_3_11", "Gen Open Failure", Shutdown),
    def("alarm_sd_3", 12, "G_SD_3_12", "Mains Overfrequency", Shutdown),
    def("alarm_sd_3", 13, "G_SD_3_13", "Mains Underfrequency", Shutdown),
    def("alarm_sd_3", 14, "G_SD_3_14", "Mains Overvoltage", Shutdown),
    def("alarm_sd_3", 15, "G_SD_3_15", "Mains Undervoltage", Shutdown),
    def("alarm_sd_4", 0, "G_SD_4_0", "Mains Frequency Change", Shutdown),
    def("alarm_sd_4", 1, "G_SD_4_1", "Mains Vector Drift", Shutdown),
    def("alarm_sd_4", 2, "G_SD_4_2", "Large Frequency Difference Warning", Shutdown),
    def("alarm_sd_4", 3, "G_SD_4_3", "Few MSC", Shutdown),
    def("alarm_sd_4", 4, "G_SD_4_4", "Maintenance 1 Time Due", Shutdown),
    def("alarm_sd_4", 5, "G_SD_4_5", "Maintenance 2 Time Due", Shutdown),
    def("alarm_sd_4", 6, "G_SD_4_6", "Maintenance 3 Time Due", Shutdown),
    def("alarm_sd_4", 7, "G_SD_4_7", "Low Water Level Alarm", Shutdown),
    def("alarm_sd_4", 8, "G_SD_4_8", "Detonation Alarm", Shutdown),
    def("alarm_sd_4", 9, "G_SD_4_9", "Gas Leak Alarm", Shutdown),
    def("alarm_sd_4", 10, "G_SD_4_10", "Gen Reverse Phase Sequence", Shutdown),
    def("alarm_sd_4", 11, "G_SD_4_11", "Gen Loss of Phase", Shutdown),
    def("alarm_sd_4", 12, "G_SD_4_12", "MSC1 Communication Failure", Shutdown),
    def("alarm_sd_4", 13, "G_SD_4_13", "MSC2 Communication Failure", Shutdown),
    def("alarm_sd_5", 0, "G_SD_5_0", "Digital Input 1 Shutdown", Shutdown),
    def("alarm_sd_5", 1, "G_SD_5_1", "Digital Input 2 Shutdown", Shutdown),
    def("alarm_sd_5", 2, "G_SD_5_2", "Digital Input 3 Shutdown", Shutdown),
    def("alarm_sd_5", 3, "G_SD_5_3", "Digital Input 4 Shutdown", Shutdown),
    def("alarm_sd_5", 4, "G_SD_5_4", "Digital Input 5 Shutdown", Shutdown),
    def("alarm_sd_5", 5, "G_SD_5_5", "Digital Input 6 Shutdown", Shutdown),
    def("alarm_sd_5", 6, "G_SD_5_6", "Digital Input 7 Shutdown", Shutdown),
    def("alarm_sd_5", 7, "G_SD_5_7", "Digital Input 8 Shutdown", Shutdown),
    def("alarm_wn_0", 0, "G_WN_0_0", "Emergency Stop Warning", Warning),
    def("alarm_wn_0", 1, "G_WN_0_1", "Overspeed Warning", Warning),
    def("alarm_wn_0", 2, "G_WN_0_2", "Underspeed Warning", Warning),
    def("alarm_wn_0", 3, "G_WN_0_3", "Speed Signal Loss Warning", Warning),
    def("alarm_wn_0", 4, "G_WN_0_4", "Gen Overfrequency Warning", Warning),
    def("alarm_wn_0", 5, "G_WN_0_5", "Gen Underfrequency Warning", Warning),
    def("alarm_wn_0", 6, "G_WN_0_6", "Gen Overvoltage Warning", Warning),
    def("alarm_wn_0", 7, "G_WN_0_7", "Gen Undervoltage Warning", Warning),
    def("alarm_wn_0", 8, "G_WN_0_8", "Crank Failure Warning", Warning),
    def("alarm_wn_0", 9, "G_WN_0_9", "Gen Overcurrent Warning", Warning),
    def("alarm_wn_0", 10, "G_WN_0_10", "Current Imbalance Warning", Warning),
    def("alarm_wn_0", 11, "G_WN_0_11", "Earth Fault Warning", Warning),
    def("alarm_wn_0", 12, "G_WN_0_12", "Reverse Power Warning", Warning),
    def("alarm_wn_0", 13, "G_WN_0_13", "Over Power Warning", Warning),
    def("alarm_wn_0", 14, "G_WN_0_14", "Loss of Excitation Warning", Warning),
    def("alarm_wn_0", 15, "G_WN_0_15", "ECU Communication Warning", Warning),
    def("alarm_wn_1", 0, "G_WN_1_0", "ECU Warning", Warning),
    def("alarm_wn_1", 1, "G_WN_1_1", "High Temp. Input Warning", Warning),
    def("alarm_wn_1", 2, "G_WN_1_2", "Low Oil Pressure Input Warning", Warning),
    def("alarm_wn_1", 8, "G_WN_1_8", "High Engine Temp. Warning", Warning),
    def("alarm_wn_1", 9, "G_WN_1_9", "Low Engine Temp. Warning", Warning),
    def("alarm_wn_1", 12, "G_WN_1_12", "High Oil Pressure Warning", Warning),
    def("alarm_wn_1", 13, "G_WN_1_13", "Low Oil Pressure Warning", Warning),
    def("alarm_wn_2", 0, "G_WN_2_0", "High Fuel Level Warning", Warning),
    def("alarm_wn_2", 1, "G_WN_2_1", "Low Fuel Level Warning", Warning),
    def("alarm_wn_2", 12, "G_WN_2_12", "Charging Failure Warning", Warning),
    def("alarm_wn_2", 13, "G_WN_2_13", "Battery Overvoltage Warning", Warning),
    def("alarm_wn_2", 14, "G_WN_2_14", "Battery Undervoltage Warning", Warning),
    def("alarm_wn_2", 15, "G_WN_2_15", "Synchronization Failure Warning", Warning),
    def("alarm_wn_3", 14, "G_WN_3_14", "Mains Overvoltage Warning", Warning),
    def("alarm_wn_3", 15, "G_WN_3_15", "Mains Undervoltage Warning", Warning),
    def("alarm_wn_4", 4, "G_WN_4_4", "Maintenance 1 Time Due Warning", Warning),
    def("alarm_wn_4", 5, "G_WN_4_5", "Maintenance 2 Time Due Warning", Warning),
    def("alarm_wn_4", 6, "G_WN_4_6", "Maintenance 3 Time Due Warning", Warning),
    def("alarm_wn_4", 7, "G_WN_4_7", "Low Water Level Warning", Warning),
    def("alarm_wn_5", 0, "G_WN_5_0", "Digital Input 1 Warning", Warning),
    def("alarm_wn_5", 1, "G_WN_5_1", "Digital Input 2 Warning", Warning),
    def("alarm_wn_5", 2, "G_WN_5_2", "Digital Input 3 Warning", Warning),
    def("alarm_wn_5", 3, "G_WN_5_3", "Digital Input 4 Warning", Warning),
    def("alarm_wn_5", 4, "G_WN_5_4", "Digital Input 5 Warning", Warning),
    def("alarm_wn_5", 5, "G_WN_5_5", "Digital Input 6 Warning", Warning),
    def("alarm_wn_5", 6, "G_WN_5_6", "Digital Input 7 Warning", Warning),
    def("alarm_wn_5", 7, "G_WN_5_7", "Digital Input 8 Warning", Warning),
    def("alarm_ts_0", 0, "G_TS_0_0", "Emergency Stop Trip&Stop", Trip),
    def("alarm_ts_0", 1, "G_TS_0_1", "Overspeed Trip&Stop", Trip),
    def("alarm_ts_0", 6, "G_TS_0_6", "Gen Overvoltage Trip&Stop", Trip),
    def("alarm_ts_0", 7, "G_TS_0_7", "Gen Undervoltage Trip&Stop", Trip),
    def("alarm_ts_0", 8, "G_TS_0_8", "Crank Failure Trip&Stop", Trip),
    def("alarm_ts_0", 9, "G_TS_0_9", "Gen Overcurrent Trip&Stop", Trip),
    def("alarm_ts_0", 12, "G_TS_0_12", "Reverse Power Trip&Stop", Trip),
    def("alarm_ts_1", 8, "G_TS_1_8", "High Engine Temp. Trip&Stop", Trip),
    def("alarm_ts_1", 13, "G_TS_1_13", "Low Oil Pressure Trip&Stop", Trip),
    def("alarm_ts_5", 0, "G_TS_5_0", "Digital Input 1 Trip&Stop", Trip),
    def("alarm_ts_5", 1, "G_TS_5_1", "Digital Input 2 Trip&Stop", Trip),
    def("alarm_ts_5", 2, "G_TS_5_2", "Digital Input 3 Trip&Stop", Trip),
    def("alarm_ts_5", 3, "G_TS_5_3", "Digital Input 4 Trip&Stop", Trip),
    def("alarm_tr_0", 0, "G_TR_0_0", "Emergency Stop Trip", Trip),
    def("alarm_tr_0", 1, "G_TR_0_1", "Overspeed Trip", Trip),
    def("alarm_tr_0", 9, "G_TR_0_9", "Gen Overcurrent Trip", Trip),
    def("alarm_tr_0", 12, "G_TR_0_12", "Reverse Power Trip", Trip),
    def("alarm_bk_0", 8, "G_BK_0_8", "Crank Failure Block", Block),
    def("alarm_bk_2", 11, "G_BK_2_11", "Stop Failure Block", Block),
    def("alarm_bk_2", 12, "G_BK_2_12", "Charging Failure Block", Block),
];

pub static HGM9520N: AlarmTable = AlarmTable {
    definitions: HGM9520N_DEFINITIONS,
    fields: &[
        "alarm_sd_0", "alarm_sd_1", "alarm_sd_2", "alarm_sd_3", "alarm_sd_4", "alarm_sd_5",
        "alarm_ts_0", "alarm_ts_1", "alarm_ts_2", "alarm_ts_3", "alarm_ts_4", "alarm_ts_5",
        "alarm_tr_0", "alarm_tr_1", "alarm_tr_2", "alarm_tr_3", "alarm_tr_4", "alarm_tr_5",
        "alarm_bk_0", "alarm_bk_1", "alarm_bk_2", "alarm_bk_3", "alarm_bk_4", "alarm_bk_5",
        "alarm_wn_0", "alarm_wn_1", "alarm_wn_2", "alarm_wn_3", "alarm_wn_4", "alarm_wn_5",
    ],
}; // }}}

// HGM9560 {{{
const HGM9560_DEFINITIONS: &[AlarmDefinition] = &[
    def("alarm_reg_01", 10, "M_SD_1_10", "Maintenance Time Due Alarm Shutdown", Shutdown),
    def("alarm_reg_02", 1, "M_SD_2_1", "MSC ID Error Alarm Shutdown", Shutdown),
    def("alarm_reg_02", 2, "M_SD_2_2", "Voltage Bus Error Alarm Shutdown", Shutdown),
    def("alarm_reg_02", 3, "M_SD_2_3", "Gen Phase Error Alarm Shutdown", Shutdown),
    def("alarm_reg_02", 4, "M_SD_2_4", "Bus (Mains) Phase Error Alarm Shutdown", Shutdown),
    def("alarm_reg_08", 0, "M_ISD_8_0", "Input 1 Shutdown", Shutdown),
    def("alarm_reg_08", 1, "M_ISD_8_1", "Input 2 Shutdown", Shutdown),
    def("alarm_reg_08", 2, "M_ISD_8_2", "Input 3 Shutdown", Shutdown),
    def("alarm_reg_08", 3, "M_ISD_8_3", "Input 4 Shutdown", Shutdown),
    def("alarm_reg_08", 4, "M_ISD_8_4", "Input 5 Shutdown", Shutdown),
    def("alarm_reg_08", 5, "M_ISD_8_5", "Input 6 Shutdown", Shutdown),
    def("alarm_reg_08", 6, "M_ISD_8_6", "Input 7 Shutdown", Shutdown),
    def("alarm_reg_08", 7, "M_ISD_8_7", "Input 8 Shutdown", Shutdown),
    def("alarm_reg_12", 1, "M_TS_12_1", "Maintenance Time Due Trip and Stop", Trip),
    def("alarm_reg_12", 4, "M_TS_12_4", "Input 1 Trip and Stop", Trip),
    def("alarm_reg_12", 5, "M_TS_12_5", "Input 2 Trip and Stop", Trip),
    def("alarm_reg_12", 6, "M_TS_12_6", "Input 3 Trip and Stop", Trip),
    def("alarm_reg_12", 7, "M_TS_12_7", "Input 4 Trip and Stop", Trip),
    def("alarm_reg_12", 8, "M_TS_12_8", "Input 5 Trip and Stop", Trip),
    def("alarm_reg_12", 9, "M_TS_12_9", "Input 6 Trip and Stop", Trip),
    def("alarm_reg_12", 10, "M_TS_12_10", "Input 7 Trip and Stop", Trip),
    def("alarm_reg_12", 11, "M_TS_12_11", "Input 8 Trip and Stop", Trip),
    def("alarm_reg_14", 8, "M_TS_14_8", "Mains Overcurrent 1 Trip and Stop", Trip),
    def("alarm_reg_14", 9, "M_TS_14_9", "Mains Overcurrent 2 Trip and Stop", Trip),
    def("alarm_reg_16", 4, "M_TR_16_4", "Input 1 Trip", Trip),
    def("alarm_reg_16", 5, "M_TR_16_5", "Input 2 Trip", Trip),
    def("alarm_reg_16", 6, "M_TR_16_6", "Input 3 Trip", Trip),
    def("alarm_reg_16", 7, "M_TR_16_7", "Input 4 Trip", Trip),
    def("alarm_reg_16", 8, "M_TR_16_8", "Input 5 Trip", Trip),
    def("alarm_reg_16", 9, "M_TR_16_9", "Input 6 Trip", Trip),
    def("alarm_reg_16", 10, "M_TR_16_10", "Input 7 Trip", Trip),
    def("alarm_reg_16", 11, "M_TR_16_11", "Input 8 Trip", Trip),
    def("alarm_reg_20", 0, "M_WN_20_0", "Battery Undervoltage Warning", Warning),
    def("alarm_reg_20", 1, "M_WN_20_1", "Battery Overvoltage Warning", Warning),
    def("alarm_reg_20", 4, "M_WN_20_4", "Input 1 Warning", Warning),
    def("alarm_reg_20", 5, "M_WN_20_5", "Input 2 Warning", Warning),
    def("alarm_reg_20", 6, "M_WN_20_6", "Input 3 Warning", Warning),
    def("alarm_reg_20", 7, "M_WN_20_7", "Input 4 Warning", Warning),
    def("alarm_reg_20", 8, "M_WN_20_8", "Input 5 Warning", Warning),
    def("alarm_reg_20", 9, "M_WN_20_9", "Input 6 Warning", Warning),
    def("alarm_reg_20", 10, "M_WN_20_10", "Input 7 Warning", Warning),
    def("alarm_reg_20", 11, "M_WN_20_11", "Input 8 Warning", Warning),
    def("alarm_reg_21", 2, "M_WN_21_2", "Sync. Failure Warning", Warning),
    def("alarm_reg_21", 6, "M_WN_21_6", "Mains Switch Transfer Failure Warning", Warning),
    def("alarm_reg_21", 7, "M_WN_21_7", "Gen Switch Transfer Failure Warning", Warning),
    def("alarm_reg_21", 15, "M_WN_21_15", "Mains Output Power Limit", Warning),
    def("alarm_reg_24", 1, "M_IND_24_1", "Maintenance Time Due Indication", Indication),
    def("alarm_reg_30", 0, "M_MT_30_0", "Input 1 Mains Trip", MainsTrip),
    def("alarm_reg_30", 1, "M_MT_30_1", "Input 2 Mains Trip", MainsTrip),
    def("alarm_reg_30", 2, "M_MT_30_2", "Input 3 Mains Trip", MainsTrip),
    def("alarm_reg_30", 3, "M_MT_30_3", "Input 4 Mains Trip", MainsTrip),
    def("alarm_reg_30", 4, "M_MT_30_4", "Input 5 Mains Trip", MainsTrip),
    def("alarm_reg_30", 5, "M_MT_30_5", "Input 6 Mains Trip", MainsTrip),
    def("alarm_reg_30", 6, "M_MT_30_6", "Input 7 Mains Trip", MainsTrip),
    def("alarm_reg_30", 7, "M_MT_30_7", "Input 8 Mains Trip", MainsTrip),
    def("alarm_reg_30", 8, "M_MT_30_8", "Mains Overcurrent 1 Mains Trip", MainsTrip),
    def("alarm_reg_30", 9, "M_MT_30_9", "Mains Overcurrent 2 Mains Trip", MainsTrip),
    def("alarm_reg_30", 10, "M_MT_30_10", "Mains Output Power Limit Mains Trip", MainsTrip),
    def("alarm_reg_44", 0, "M001", "Mains Abnormal", Warning),
    def("alarm_reg_44", 1, "M002", "Mains Overvoltage", Warning),
    def("alarm_reg_44", 2, "M003", "Mains Undervoltage", Warning),
    def("alarm_reg_44", 3, "M004", "Mains Overfrequency", Warning),
    def("alarm_reg_44", 4, "M005", "Mains Underfrequency", Warning),
    def("alarm_reg_44", 5, "M006", "Mains Loss Phase", Warning),
    def("alarm_reg_44", 6, "M007", "Mains Reverse Phase Sequence", Warning),
    def("alarm_reg_44", 7, "M008", "Mains Blackout", Warning),
];

pub static HGM9560: AlarmTable = AlarmTable {
    definitions: HGM9560_DEFINITIONS,
    fields: &[
        "alarm_reg_00", "alarm_reg_01", "alarm_reg_02", "alarm_reg_08",
        "alarm_reg_12", "alarm_reg_14", "alarm_reg_16", "alarm_reg_20",
        "alarm_reg_21", "alarm_reg_24", "alarm_reg_30", "alarm_reg_44",
    ],
}; // }}}
