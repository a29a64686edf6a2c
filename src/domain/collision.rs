/// Overlap queries.

use std::collections::BTreeSet;

use super::entity::Rect;

/// Something the player must not touch.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum HazardHandle {
    /// Index into the session's "Don't Touch" tiles.
    Tile(usize),
    /// Index into the session's enemies.
    Enemy(usize),
}

/// Unique handles whose box overlaps `subject`. Several shapes mapping to
/// one handle collapse to a single entry.
pub fn overlapping<H, I>(subject: &Rect, group: I) -> BTreeSet<H>
where
    H: Ord + Copy,
    I: IntoIterator<Item = (H, Rect)>,
{
    group
        .into_iter()
        .filter(|(_, rect)| subject.intersects(rect))
        .map(|(handle, _)| handle)
        .collect()
}

pub fn any_overlap<I>(subject: &Rect, group: I) -> bool
where
    I: IntoIterator<Item = Rect>,
{
    group.into_iter().any(|rect| subject.intersects(&rect))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use pretty_assertions::assert_eq;

    fn square(x: f32, y: f32) -> Rect {
        Rect::from_center(Vec2::new(x, y), Vec2::splat(32.0))
    }

    #[test]
    fn duplicates_collapse_to_one_handle() {
        let player = square(0.0, 0.0);
        let hits = overlapping(&player, [(3u32, square(10.0, 0.0)), (3, square(-10.0, 0.0)), (4, square(500.0, 0.0))]);
        assert_eq!(hits.into_iter().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn hazard_handles_are_tagged() {
        let player = square(0.0, 0.0);
        let group = [
            (HazardHandle::Tile(0), square(100.0, 0.0)),
            (HazardHandle::Enemy(0), square(20.0, 0.0)),
            (HazardHandle::Tile(1), square(0.0, 20.0)),
        ];
        let hits = overlapping(&player, group);
        assert_eq!(
            hits.into_iter().collect::<Vec<_>>(),
            vec![HazardHandle::Tile(1), HazardHandle::Enemy(0)]
        );
    }

    #[test]
    fn any_overlap_on_empty_group() {
        let none: [Rect; 0] = [];
        assert!(!any_overlap(&square(0.0, 0.0), none));
    }
}
