//! Rename hazard: four writes to the same destination register saturate
//! its outstanding-tag budget; the fifth stalls until the oldest
//! response clears a pending bit, and no write is lost.

use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};

use zamlet_core::common::DesignFault;
use zamlet_core::config::Config;
use zamlet_core::rename::{RegSpec, UnitOp, VliwSlot};
use zamlet_core::units::AluMode;
use zamlet_core::Lane;

const TARGET: RegSpec = RegSpec {
    kind: zamlet_core::common::tag::RegKind::D,
    index: 5,
};

fn write_slot(immediate: u64) -> VliwSlot {
    VliwSlot {
        unit: UnitOp::Alu(AluMode::Add),
        src1: None,
        src2: None,
        predicate: None,
        dest: Some(TARGET),
        immediate,
    }
}

#[fixture]
fn lane_with_four_d_tags() -> Lane {
    let mut config = Config::default();
    config.registers.d_tag_width = 2;
    Lane::new(&config)
}

#[rstest]
fn fifth_write_stalls_until_a_response_frees_a_tag(mut lane_with_four_d_tags: Lane) {
    let lane = &mut lane_with_four_d_tags;

    for immediate in 0..4u64 {
        lane.dispatch(&write_slot(immediate))
            .expect("budgeted tag should allocate");
    }

    let err = lane
        .dispatch(&write_slot(99))
        .expect_err("a fifth outstanding write must stall, not silently overwrite a tag");
    assert!(matches!(err, DesignFault::TagStillPending(_)));

    lane.step().unwrap();
    assert_eq!(lane.stats().issued_alu, 1, "the oldest write should issue and complete first");

    lane.dispatch(&write_slot(99))
        .expect("freed tag should admit the stalled write");

    for _ in 0..4 {
        lane.step().unwrap();
    }
    assert_eq!(
        lane.stats().issued_alu,
        5,
        "every one of the five writes must eventually issue; none is lost"
    );
}
