use crate::board::{Board, STEP_REWARD};
use crate::config::BoardParams;
use crate::error::Result;
use crate::grid::Coord;
use crate::rng::Rng;

/// Random square board. Each cell independently becomes a wall (reward 0)
/// with `wall_probability`; otherwise a +1 or -1 state (fair coin) with
/// `reward_probability`; otherwise a step-cost cell. No terminals.
pub fn generate(params: &BoardParams) -> Result<Board> {
    params.validate()?;
    let n = params.size;
    let mut rng = Rng::new(params.seed);
    let mut rewards = vec![vec![0.0; n]; n];
    let mut walls = Vec::new();

    for (i, row) in rewards.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = if rng.chance(params.wall_probability) {
                walls.push(Coord::new(i as i32, j as i32));
                0.0
            } else if rng.chance(params.reward_probability) {
                if rng.chance(0.5) { 1.0 } else { -1.0 }
            } else {
                STEP_REWARD
            };
        }
    }

    Board::new(rewards, walls, [])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_per_seed() {
        let params = BoardParams { size: 8, ..Default::default() };
        let a = generate(&params).unwrap();
        let b = generate(&params).unwrap();
        assert_eq!(a.rewards(), b.rewards());
        assert_eq!(a.interior_walls(), b.interior_walls());

        let c = generate(&BoardParams { seed: 43, ..params }).unwrap();
        assert_ne!(a.rewards(), c.rewards());
    }

    #[test]
    fn cells_take_allowed_values() {
        let board = generate(&BoardParams { size: 20, ..Default::default() }).unwrap();
        for c in board.coords() {
            let r = board.reward(c);
            if board.is_wall(c) {
                assert_eq!(r, 0.0);
            } else {
                assert!(r == 1.0 || r == -1.0 || r == STEP_REWARD, "unexpected reward {r}");
            }
        }
        assert!(board.terminals().is_empty());
    }

    #[test]
    fn extreme_probabilities() {
        let all_walls = generate(&BoardParams { size: 4, wall_probability: 1.0, ..Default::default() }).unwrap();
        assert_eq!(all_walls.states().count(), 0);

        let plain = generate(&BoardParams {
            size: 4,
            wall_probability: 0.0,
            reward_probability: 0.0,
            ..Default::default()
        })
        .unwrap();
        assert!(plain.coords().all(|c| plain.reward(c) == STEP_REWARD));
    }
}
