//! Lane configuration: widths, sizes, reservation-station slot counts,
//! pipeline buffering, and mesh geometry.
//!
//! Every parameter has a documented default, mirroring how a real
//! generator would hand this crate a JSON configuration file while this
//! crate itself owns no file, CLI, or environment-variable loading —
//! sourcing a [`Config`] value from outside this process is out of scope.
//!
//! # Examples
//!
//! ```
//! use zamlet_core::config::Config;
//!
//! let config = Config::default();
//! assert_eq!(config.registers.a_width, 16);
//!
//! let json = r#"{
//!     "registers": { "a_width": 32, "a_tag_width": 4 }
//! }"#;
//! let config: Config = serde_json::from_str(json).unwrap();
//! assert_eq!(config.registers.a_width, 32);
//! assert_eq!(config.registers.d_width, 32);
//! ```

use serde::Deserialize;

mod defaults {
    /// Default width, in bits, of an A-register (address/short value).
    pub const A_WIDTH: u32 = 16;
    /// Default width, in bits, of a D-register (data/wide value).
    pub const D_WIDTH: u32 = 32;
    /// Default tag width for A-registers: `2^A_TAG_WIDTH` outstanding
    /// writes may be in flight to a single A-register at once.
    pub const A_TAG_WIDTH: u32 = 3;
    /// Default tag width for D-registers.
    pub const D_TAG_WIDTH: u32 = 3;
    /// Default tag width for P-registers (predicates rarely need deep
    /// renaming, so this is narrower than the data banks).
    pub const P_TAG_WIDTH: u32 = 2;
    /// Default number of architectural A-registers.
    pub const NUM_A_REGS: u32 = 16;
    /// Default number of architectural D-registers.
    pub const NUM_D_REGS: u32 = 32;
    /// Default number of architectural P-registers.
    pub const NUM_P_REGS: u32 = 8;

    /// Default number of slots in the ALU reservation station.
    pub const RS_ALU_SLOTS: usize = 4;
    /// Default number of slots in the LSU (Data-Memory) reservation station.
    pub const RS_LSU_SLOTS: usize = 4;
    /// Default number of slots in the Packet-Send reservation station.
    pub const RS_PACKET_SEND_SLOTS: usize = 4;
    /// Default number of slots in the Packet-Receive reservation station.
    pub const RS_PACKET_RECV_SLOTS: usize = 4;
    /// Default number of slots in the predicate reservation station.
    pub const RS_PREDICATE_SLOTS: usize = 2;

    /// Default number of entries in the per-lane witem table.
    pub const WITEM_TABLE_SIZE: usize = 16;
    /// Default number of rows in the Kamlet Witem Table (sync coordinator).
    pub const KWT_SIZE: usize = 8;

    /// Default vline size in bytes.
    pub const VLINE_BYTES: u32 = 64;
    /// Default number of bytes of a memory word owned by one lane.
    pub const WORD_BYTES: u32 = 8;
    /// Default page size in bytes, for TLB/page-crossing detection.
    pub const PAGE_BYTES: u32 = 4096;
    /// Default depth (in words) of the per-lane data memory.
    pub const DATA_MEMORY_DEPTH: u32 = 4096;
    /// Default maximum number of outstanding tags tracked by one sync
    /// group (`maxTags` and `maxResponseTags` are unified into one
    /// parameter; see `DESIGN.md`).
    pub const MAX_TAGS: u32 = 16;

    /// Default mesh width in jamlet columns.
    pub const J_COLS: u32 = 4;
    /// Default mesh height in jamlet rows.
    pub const J_ROWS: u32 = 4;
    /// Default mesh width in kamlet columns.
    pub const K_COLS: u32 = 2;
    /// Default mesh height in kamlet rows.
    pub const K_ROWS: u32 = 2;
    /// Default number of jamlets per kamlet.
    pub const J_IN_K: u32 = 4;
    /// Default number of lanes participating in one memory word (the `j_in_l`
    /// of §4.6's Tag Mapping Calculator geometry).
    pub const J_IN_L: u32 = 16;

    /// Default packet length field width, in bits.
    pub const PACKET_LENGTH_WIDTH: u32 = 8;
    /// Default packet x-position field width, in bits.
    pub const X_POS_WIDTH: u32 = 8;
    /// Default packet y-position field width, in bits.
    pub const Y_POS_WIDTH: u32 = 8;

    /// Default forward-register presence between adjacent Witem Monitor
    /// stages.
    pub const STAGE_FORWARD_REGISTERS: bool = true;
    /// Default backward (stall/credit) register presence between adjacent
    /// Witem Monitor stages.
    pub const STAGE_BACKWARD_REGISTERS: bool = true;
}

/// Register-bank widths, tag widths, and architectural register counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RegisterConfig {
    /// Width in bits of an A-register.
    #[serde(default = "RegisterConfig::default_a_width")]
    pub a_width: u32,
    /// Width in bits of a D-register.
    #[serde(default = "RegisterConfig::default_d_width")]
    pub d_width: u32,
    /// Tag width for A-registers.
    #[serde(default = "RegisterConfig::default_a_tag_width")]
    pub a_tag_width: u32,
    /// Tag width for D-registers.
    #[serde(default = "RegisterConfig::default_d_tag_width")]
    pub d_tag_width: u32,
    /// Tag width for P-registers.
    #[serde(default = "RegisterConfig::default_p_tag_width")]
    pub p_tag_width: u32,
    /// Number of architectural A-registers.
    #[serde(default = "RegisterConfig::default_num_a_regs")]
    pub num_a_regs: u32,
    /// Number of architectural D-registers.
    #[serde(default = "RegisterConfig::default_num_d_regs")]
    pub num_d_regs: u32,
    /// Number of architectural P-registers.
    #[serde(default = "RegisterConfig::default_num_p_regs")]
    pub num_p_regs: u32,
}

impl RegisterConfig {
    fn default_a_width() -> u32 {
        defaults::A_WIDTH
    }
    fn default_d_width() -> u32 {
        defaults::D_WIDTH
    }
    fn default_a_tag_width() -> u32 {
        defaults::A_TAG_WIDTH
    }
    fn default_d_tag_width() -> u32 {
        defaults::D_TAG_WIDTH
    }
    fn default_p_tag_width() -> u32 {
        defaults::P_TAG_WIDTH
    }
    fn default_num_a_regs() -> u32 {
        defaults::NUM_A_REGS
    }
    fn default_num_d_regs() -> u32 {
        defaults::NUM_D_REGS
    }
    fn default_num_p_regs() -> u32 {
        defaults::NUM_P_REGS
    }
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self {
            a_width: defaults::A_WIDTH,
            d_width: defaults::D_WIDTH,
            a_tag_width: defaults::A_TAG_WIDTH,
            d_tag_width: defaults::D_TAG_WIDTH,
            p_tag_width: defaults::P_TAG_WIDTH,
            num_a_regs: defaults::NUM_A_REGS,
            num_d_regs: defaults::NUM_D_REGS,
            num_p_regs: defaults::NUM_P_REGS,
        }
    }
}

/// Reservation-station slot counts, one field per station kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReservationStationConfig {
    /// Slots in the ALU reservation station.
    #[serde(default = "ReservationStationConfig::default_alu_slots")]
    pub alu_slots: usize,
    /// Slots in the Data-Memory (LSU) reservation station.
    #[serde(default = "ReservationStationConfig::default_lsu_slots")]
    pub lsu_slots: usize,
    /// Slots in the Packet-Send reservation station.
    #[serde(default = "ReservationStationConfig::default_packet_send_slots")]
    pub packet_send_slots: usize,
    /// Slots in the Packet-Receive reservation station.
    #[serde(default = "ReservationStationConfig::default_packet_recv_slots")]
    pub packet_recv_slots: usize,
    /// Slots in the predicate reservation station.
    #[serde(default = "ReservationStationConfig::default_predicate_slots")]
    pub predicate_slots: usize,
}

impl ReservationStationConfig {
    fn default_alu_slots() -> usize {
        defaults::RS_ALU_SLOTS
    }
    fn default_lsu_slots() -> usize {
        defaults::RS_LSU_SLOTS
    }
    fn default_packet_send_slots() -> usize {
        defaults::RS_PACKET_SEND_SLOTS
    }
    fn default_packet_recv_slots() -> usize {
        defaults::RS_PACKET_RECV_SLOTS
    }
    fn default_predicate_slots() -> usize {
        defaults::RS_PREDICATE_SLOTS
    }
}

impl Default for ReservationStationConfig {
    fn default() -> Self {
        Self {
            alu_slots: defaults::RS_ALU_SLOTS,
            lsu_slots: defaults::RS_LSU_SLOTS,
            packet_send_slots: defaults::RS_PACKET_SEND_SLOTS,
            packet_recv_slots: defaults::RS_PACKET_RECV_SLOTS,
            predicate_slots: defaults::RS_PREDICATE_SLOTS,
        }
    }
}

/// Witem table, sync coordinator, and transfer-geometry sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WitemConfig {
    /// Number of entries in the per-lane witem table.
    #[serde(default = "WitemConfig::default_table_size")]
    pub table_size: usize,
    /// Number of rows in the Kamlet Witem Table (sync coordinator).
    #[serde(default = "WitemConfig::default_kwt_size")]
    pub kwt_size: usize,
    /// Vline size in bytes.
    #[serde(default = "WitemConfig::default_vline_bytes")]
    pub vline_bytes: u32,
    /// Unified `maxTags`/`maxResponseTags` parameter (see `DESIGN.md`).
    #[serde(default = "WitemConfig::default_max_tags")]
    pub max_tags: u32,
    /// Forward (data) register present between adjacent pipeline stages.
    #[serde(default = "WitemConfig::default_stage_forward_registers")]
    pub stage_forward_registers: bool,
    /// Backward (stall/credit) register present between adjacent pipeline
    /// stages.
    #[serde(default = "WitemConfig::default_stage_backward_registers")]
    pub stage_backward_registers: bool,
}

impl WitemConfig {
    fn default_table_size() -> usize {
        defaults::WITEM_TABLE_SIZE
    }
    fn default_kwt_size() -> usize {
        defaults::KWT_SIZE
    }
    fn default_vline_bytes() -> u32 {
        defaults::VLINE_BYTES
    }
    fn default_max_tags() -> u32 {
        defaults::MAX_TAGS
    }
    fn default_stage_forward_registers() -> bool {
        defaults::STAGE_FORWARD_REGISTERS
    }
    fn default_stage_backward_registers() -> bool {
        defaults::STAGE_BACKWARD_REGISTERS
    }
}

impl Default for WitemConfig {
    fn default() -> Self {
        Self {
            table_size: defaults::WITEM_TABLE_SIZE,
            kwt_size: defaults::KWT_SIZE,
            vline_bytes: defaults::VLINE_BYTES,
            max_tags: defaults::MAX_TAGS,
            stage_forward_registers: defaults::STAGE_FORWARD_REGISTERS,
            stage_backward_registers: defaults::STAGE_BACKWARD_REGISTERS,
        }
    }
}

/// Mesh geometry: how many jamlets and kamlets surround this lane.
///
/// Mesh *construction* is out of scope; only the geometry parameters a
/// single lane needs — bounds-checking a broadcast, computing its own
/// `(x, y)` — live here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GeometryConfig {
    /// Mesh width in jamlet columns.
    #[serde(default = "GeometryConfig::default_j_cols")]
    pub j_cols: u32,
    /// Mesh height in jamlet rows.
    #[serde(default = "GeometryConfig::default_j_rows")]
    pub j_rows: u32,
    /// Mesh width in kamlet columns.
    #[serde(default = "GeometryConfig::default_k_cols")]
    pub k_cols: u32,
    /// Mesh height in kamlet rows.
    #[serde(default = "GeometryConfig::default_k_rows")]
    pub k_rows: u32,
    /// Jamlets per kamlet.
    #[serde(default = "GeometryConfig::default_j_in_k")]
    pub j_in_k: u32,
    /// Lanes participating in one memory word; the `j_in_l` referenced
    /// throughout §4.6's Tag Mapping Calculator geometry.
    #[serde(default = "GeometryConfig::default_j_in_l")]
    pub j_in_l: u32,
}

impl GeometryConfig {
    fn default_j_cols() -> u32 {
        defaults::J_COLS
    }
    fn default_j_rows() -> u32 {
        defaults::J_ROWS
    }
    fn default_k_cols() -> u32 {
        defaults::K_COLS
    }
    fn default_k_rows() -> u32 {
        defaults::K_ROWS
    }
    fn default_j_in_k() -> u32 {
        defaults::J_IN_K
    }
    fn default_j_in_l() -> u32 {
        defaults::J_IN_L
    }
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            j_cols: defaults::J_COLS,
            j_rows: defaults::J_ROWS,
            k_cols: defaults::K_COLS,
            k_rows: defaults::K_ROWS,
            j_in_k: defaults::J_IN_K,
            j_in_l: defaults::J_IN_L,
        }
    }
}

/// Packet header field widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PacketConfig {
    /// Width, in bits, of the packet `length` field.
    #[serde(default = "PacketConfig::default_length_width")]
    pub length_width: u32,
    /// Width, in bits, of the packet `xDest` field.
    #[serde(default = "PacketConfig::default_x_pos_width")]
    pub x_pos_width: u32,
    /// Width, in bits, of the packet `yDest` field.
    #[serde(default = "PacketConfig::default_y_pos_width")]
    pub y_pos_width: u32,
}

impl PacketConfig {
    fn default_length_width() -> u32 {
        defaults::PACKET_LENGTH_WIDTH
    }
    fn default_x_pos_width() -> u32 {
        defaults::X_POS_WIDTH
    }
    fn default_y_pos_width() -> u32 {
        defaults::Y_POS_WIDTH
    }
}

impl Default for PacketConfig {
    fn default() -> Self {
        Self {
            length_width: defaults::PACKET_LENGTH_WIDTH,
            x_pos_width: defaults::X_POS_WIDTH,
            y_pos_width: defaults::Y_POS_WIDTH,
        }
    }
}

/// Data-memory geometry: per-lane word/page/depth sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MemoryConfig {
    /// Bytes of a memory word owned by one lane.
    #[serde(default = "MemoryConfig::default_word_bytes")]
    pub word_bytes: u32,
    /// Page size in bytes, for TLB/page-crossing detection.
    #[serde(default = "MemoryConfig::default_page_bytes")]
    pub page_bytes: u32,
    /// Depth, in words, of the per-lane data memory.
    #[serde(default = "MemoryConfig::default_data_memory_depth")]
    pub data_memory_depth: u32,
}

impl MemoryConfig {
    fn default_word_bytes() -> u32 {
        defaults::WORD_BYTES
    }
    fn default_page_bytes() -> u32 {
        defaults::PAGE_BYTES
    }
    fn default_data_memory_depth() -> u32 {
        defaults::DATA_MEMORY_DEPTH
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            word_bytes: defaults::WORD_BYTES,
            page_bytes: defaults::PAGE_BYTES,
            data_memory_depth: defaults::DATA_MEMORY_DEPTH,
        }
    }
}

/// Root configuration for one amlet lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Register bank widths and tag widths.
    #[serde(default)]
    pub registers: RegisterConfig,
    /// Reservation-station slot counts.
    #[serde(default)]
    pub reservation_stations: ReservationStationConfig,
    /// Witem table and sync-coordinator sizes.
    #[serde(default)]
    pub witem: WitemConfig,
    /// Mesh geometry.
    #[serde(default)]
    pub geometry: GeometryConfig,
    /// Packet header field widths.
    #[serde(default)]
    pub packet: PacketConfig,
    /// Data-memory geometry.
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registers: RegisterConfig::default(),
            reservation_stations: ReservationStationConfig::default(),
            witem: WitemConfig::default(),
            geometry: GeometryConfig::default(),
            packet: PacketConfig::default(),
            memory: MemoryConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_values() {
        let config = Config::default();
        assert_eq!(config.registers.a_width, 16);
        assert_eq!(config.registers.d_width, 32);
        assert_eq!(config.reservation_stations.alu_slots, 4);
        assert_eq!(config.witem.table_size, 16);
        assert_eq!(config.geometry.j_cols, 4);
    }

    #[test]
    fn partial_json_fills_remaining_fields_with_defaults() {
        let json = r#"{ "witem": { "table_size": 32 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.witem.table_size, 32);
        assert_eq!(config.witem.kwt_size, 8);
        assert_eq!(config.registers.a_width, 16);
    }

    #[test]
    fn empty_json_object_reproduces_default() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }
}
