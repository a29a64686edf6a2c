/// Patrol controller for enemies and moving platforms.

use super::entity::{Body, PatrolBoundary};

/// Which velocity components were negated this tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Reversal {
    pub horizontal: bool,
    pub vertical: bool,
}

impl Reversal {
    pub fn any(self) -> bool {
        self.horizontal || self.vertical
    }
}

/// Reverse a velocity component when the matching extent is past a limit
/// and still heading outward. Each side is checked on its own; unset sides
/// are skipped.
pub fn apply_patrol(body: &mut Body, boundary: &PatrolBoundary) -> Reversal {
    let mut reversal = Reversal::default();

    if let Some(limit) = boundary.right {
        if body.right() > limit && body.velocity.x > 0.0 {
            body.velocity.x = -body.velocity.x;
            reversal.horizontal = true;
        }
    }
    if let Some(limit) = boundary.left {
        if body.left() < limit && body.velocity.x < 0.0 {
            body.velocity.x = -body.velocity.x;
            reversal.horizontal = true;
        }
    }
    if let Some(limit) = boundary.top {
        if body.top() > limit && body.velocity.y > 0.0 {
            body.velocity.y = -body.velocity.y;
            reversal.vertical = true;
        }
    }
    if let Some(limit) = boundary.bottom {
        if body.bottom() < limit && body.velocity.y < 0.0 {
            body.velocity.y = -body.velocity.y;
            reversal.vertical = true;
        }
    }

    reversal
}
