// Turn-scoped board model
//
// Wraps the occupancy map with the snakes it was built from and answers the
// questions the route engine asks: is a cell blocked when we get there, who is
// next to it, how much room lies behind it. Score overlays written by opponent
// simulations live in the map cells and die with the Board at the end of the turn.

use rand::Rng;
use std::fmt;

use crate::config::Config;
use crate::error::MalformedState;
use crate::map::{Cell, OccupancyMap, Segment, Target};
use crate::types::{Coord, Direction, GameState};

/// Opponent labels for the rendered grid; F, M and X are taken by food,
/// the own snake and decoys.
const OPPONENT_LABELS: &[u8] = b"ABCDEGHIJKLNOPQRSTUVWYZ";

/// A snake as the route engine sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    pub id: String,
    /// Head first, tail last; never empty
    pub body: Vec<Coord>,
    pub health: i32,
    pub is_self: bool,
}

impl Snake {
    pub fn head(&self) -> Coord {
        self.body[0]
    }

    pub fn tail(&self) -> Coord {
        self.body[self.body.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }
}

pub struct Board<'a> {
    config: &'a Config,
    width: i32,
    height: i32,
    snakes: Vec<Snake>,
    me: usize,
    food: Vec<Coord>,
    map: OccupancyMap,
    step_limit: usize,
    connectivity: Vec<Option<usize>>,
}

impl<'a> Board<'a> {
    /// Validates the decoded state and builds the turn's board.
    ///
    /// # Arguments
    /// * `state` - Decoded move request
    /// * `config` - Tuning constants for this turn
    /// * `rng` - Randomness for decoy selection
    ///
    /// # Returns
    /// * `Result<Board, MalformedState>` - The board, or why the state cannot be played
    pub fn new<R: Rng + ?Sized>(
        state: &GameState,
        config: &'a Config,
        rng: &mut R,
    ) -> Result<Self, MalformedState> {
        let (width, height) = (state.board.width, state.board.height);
        let cells = match width.checked_mul(height) {
            Some(n) if width > 0 && height > 0 => n as usize,
            _ => return Err(MalformedState::Dimensions { width, height }),
        };
        if cells > config.route.max_board_cells {
            return Err(MalformedState::Dimensions { width, height });
        }
        let on_board = |p: &Coord| 0 <= p.x && p.x < width && 0 <= p.y && p.y < height;

        if let Some(p) = state.board.food.iter().find(|&p| !on_board(p)) {
            return Err(MalformedState::OutOfBounds { what: "food", x: p.x, y: p.y });
        }

        let mut snakes = Vec::with_capacity(state.board.snakes.len());
        for snake in &state.board.snakes {
            if snake.body.is_empty() {
                return Err(MalformedState::EmptyBody(snake.id.clone()));
            }
            if let Some(p) = snake.body.iter().find(|&p| !on_board(p)) {
                return Err(MalformedState::OutOfBounds {
                    what: "snake segment",
                    x: p.x,
                    y: p.y,
                });
            }
            snakes.push(Snake {
                id: snake.id.clone(),
                body: snake.body.clone(),
                health: snake.health,
                is_self: snake.id == state.you.id,
            });
        }

        let me = snakes
            .iter()
            .position(|s| s.is_self)
            .ok_or_else(|| MalformedState::MissingSelf(state.you.id.clone()))?;

        let food = state.board.food.clone();
        let map = OccupancyMap::build(width, height, &food, &snakes, &config.targets, rng);

        let mut board = Board {
            config,
            width,
            height,
            snakes,
            me,
            food,
            map,
            step_limit: config.route.step_limit,
            connectivity: vec![None; cells],
        };
        board.bump_borders();
        Ok(board)
    }

    fn bump_borders(&mut self) {
        let (width, height) = (self.width, self.height);
        let delta = self.config.scores.border_bump;
        for x in 0..width {
            for y in 0..height {
                if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                    self.map[Coord::new(x, y)].bump(delta);
                }
            }
        }
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn map(&self) -> &OccupancyMap {
        &self.map
    }

    pub fn snakes(&self) -> &[Snake] {
        &self.snakes
    }

    /// The controlled snake
    pub fn me(&self) -> &Snake {
        &self.snakes[self.me]
    }

    /// Opponents with their board index, in board order
    pub fn opponents(&self) -> impl Iterator<Item = (usize, &Snake)> + '_ {
        self.snakes.iter().enumerate().filter(|(_, s)| !s.is_self)
    }

    pub fn food(&self) -> &[Coord] {
        &self.food
    }

    pub fn decoys(&self) -> &[Coord] {
        self.map.decoys()
    }

    /// Interior corner targets that fit on the board
    pub fn corners(&self) -> Vec<Coord> {
        let (w, h) = (self.width, self.height);
        [(1, 1), (1, h - 2), (w - 2, 1), (w - 2, h - 2)]
            .into_iter()
            .map(Coord::from)
            .filter(|&p| self.in_bounds(p))
            .collect()
    }

    pub fn in_bounds(&self, p: Coord) -> bool {
        self.map.contains(p)
    }

    pub fn cell(&self, p: Coord) -> Option<&Cell> {
        self.map.get(p)
    }

    /// Current cell score, zero off the board
    pub fn score(&self, p: Coord) -> i32 {
        self.map.get(p).map_or(0, Cell::score)
    }

    /// In-bounds orthogonal neighbours in direction order
    pub fn neighbors(&self, p: Coord) -> impl Iterator<Item = Coord> + '_ {
        Direction::all()
            .into_iter()
            .map(move |d| d.apply(&p))
            .filter(move |&n| self.in_bounds(n))
    }

    /// The segment on `p` that is still there `offset` turns from now
    pub fn snake_on(&self, p: Coord, offset: usize) -> Option<&Segment> {
        self.map
            .get(p)
            .and_then(Cell::segment)
            .filter(|s| s.vacates_in > offset)
    }

    pub fn food_around(&self, p: Coord) -> bool {
        self.neighbors(p).any(|n| self.map[n].is_food())
    }

    /// Opponents whose head or tail, still present `offset` turns from now,
    /// touches `p`. One entry per touching segment.
    pub fn snakes_around(&self, p: Coord, offset: usize) -> Vec<usize> {
        self.neighbors(p)
            .filter_map(|n| self.snake_on(n, offset))
            .filter(|s| (s.is_head || s.is_tail) && s.snake != self.me)
            .map(|s| s.snake)
            .collect()
    }

    /// Whether a route may not enter `p` on turn `offset`.
    ///
    /// `simulation` is set for opponent simulations, which do not respect
    /// the tail of an opponent about to eat.
    pub fn blocked(&self, p: Coord, offset: usize, simulation: bool) -> bool {
        let Some(cell) = self.map.get(p) else {
            return true;
        };
        let Target::Snake(segment) = cell.target else {
            return false;
        };
        if segment.vacates_in > offset {
            return true;
        }
        if !segment.is_tail {
            return false;
        }
        // Eating keeps the tail in place
        if !simulation
            && segment.snake != self.me
            && self.food_around(self.snakes[segment.snake].head())
        {
            return true;
        }
        segment.snake == self.me && self.me().len() < self.config.snake.min_length
    }

    /// Open space estimate behind `p`: a wandering walk over unblocked cells,
    /// memoized for the turn. Cheap and order dependent, not a flood fill.
    pub fn connectivity(&mut self, p: Coord) -> usize {
        let Some(index) = self.map.index_of(p) else {
            return 0;
        };
        if let Some(known) = self.connectivity[index] {
            return known;
        }

        let mut seen = vec![false; self.map.len()];
        let mut count = 0;
        let mut next = p;
        for _ in 0..self.map.len() {
            let before = count;
            for direction in Direction::all() {
                let n = direction.apply(&next);
                if self.blocked(n, 0, false) {
                    continue;
                }
                let Some(i) = self.map.index_of(n) else {
                    continue;
                };
                if seen[i] {
                    continue;
                }
                seen[i] = true;
                count += 1;
                next = n;
            }
            if count == before {
                break;
            }
        }

        self.connectivity[index] = Some(count);
        count
    }

    pub fn bump_score(&mut self, p: Coord, delta: i32) {
        if let Some(cell) = self.map.get_mut(p) {
            cell.bump(delta);
        }
    }

    /// Adds `delta` to every in-bounds orthogonal neighbour of `p`
    pub fn bump_score_around(&mut self, p: Coord, delta: i32) {
        for direction in Direction::all() {
            self.bump_score(direction.apply(&p), delta);
        }
    }

    /// Step bound for the routes still to be resolved this turn
    pub fn step_limit(&self) -> usize {
        self.step_limit
    }

    pub fn tighten_step_limit(&mut self, steps: usize) {
        self.step_limit = self.step_limit.min(steps);
    }
}

impl fmt::Display for Board<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut labels = vec![b'M'; self.snakes.len()];
        for (k, (i, _)) in self.opponents().enumerate() {
            labels[i] = OPPONENT_LABELS[k % OPPONENT_LABELS.len()];
        }

        for y in 0..self.height {
            let row: String = (0..self.width)
                .map(|x| match self.map[Coord::new(x, y)].target {
                    Target::Food => 'F',
                    Target::Empty { decoy: true } => 'X',
                    Target::Empty { decoy: false } => '-',
                    Target::Snake(s) if s.is_head => labels[s.snake] as char,
                    Target::Snake(s) => (labels[s.snake] as char).to_ascii_lowercase(),
                })
                .collect();
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Battlesnake, Game};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn body(cells: &[(i32, i32)]) -> Vec<Coord> {
        cells.iter().map(|&p| p.into()).collect()
    }

    fn state(
        width: i32,
        height: i32,
        me: &[(i32, i32)],
        others: &[&[(i32, i32)]],
        food: &[(i32, i32)],
    ) -> GameState {
        let you = Battlesnake::new("me", 100, body(me));
        let mut snakes = vec![you.clone()];
        for (i, other) in others.iter().enumerate() {
            snakes.push(Battlesnake::new(&format!("other-{}", i), 100, body(other)));
        }
        GameState {
            game: Game::default(),
            turn: 0,
            board: crate::types::Board {
                width,
                height,
                food: body(food),
                snakes,
                hazards: vec![],
            },
            you,
        }
    }

    fn no_decoys() -> Config {
        let mut config = Config::default_hardcoded();
        config.targets.decoy_count = 0;
        config
    }

    fn build_board<'a>(state: &GameState, config: &'a Config) -> Board<'a> {
        let mut rng = StdRng::seed_from_u64(0);
        Board::new(state, config, &mut rng).unwrap()
    }

    #[test]
    fn test_rejects_malformed_states() {
        let config = Config::default_hardcoded();
        let mut rng = StdRng::seed_from_u64(0);

        let bad = state(0, 11, &[(0, 0)], &[], &[]);
        assert_eq!(
            Board::new(&bad, &config, &mut rng).err(),
            Some(MalformedState::Dimensions { width: 0, height: 11 })
        );

        let mut missing = state(11, 11, &[(0, 0)], &[], &[]);
        missing.you.id = "ghost".to_string();
        assert_eq!(
            Board::new(&missing, &config, &mut rng).err(),
            Some(MalformedState::MissingSelf("ghost".to_string()))
        );

        let mut empty = state(11, 11, &[(0, 0)], &[], &[]);
        empty.board.snakes[0].body.clear();
        assert_eq!(
            Board::new(&empty, &config, &mut rng).err(),
            Some(MalformedState::EmptyBody("me".to_string()))
        );

        let huge = state(65536, 65536, &[(0, 0)], &[], &[]);
        assert_eq!(
            Board::new(&huge, &config, &mut rng).err(),
            Some(MalformedState::Dimensions { width: 65536, height: 65536 })
        );

        // Fits in an i32 but exceeds the configured board size
        let oversized = state(40000, 40000, &[(0, 0)], &[], &[]);
        assert_eq!(
            Board::new(&oversized, &config, &mut rng).err(),
            Some(MalformedState::Dimensions { width: 40000, height: 40000 })
        );

        let outside = state(11, 11, &[(0, 0)], &[], &[(11, 3)]);
        assert_eq!(
            Board::new(&outside, &config, &mut rng).err(),
            Some(MalformedState::OutOfBounds { what: "food", x: 11, y: 3 })
        );
    }

    #[test]
    fn test_blocked_respects_vacating_segments() {
        let config = no_decoys();
        let s = state(11, 11, &[(5, 5), (5, 6), (5, 7)], &[], &[]);
        let board = build_board(&s, &config);

        assert!(board.blocked(Coord::new(-1, 0), 0, false));
        assert!(board.blocked(Coord::new(0, 11), 0, false));
        assert!(!board.blocked(Coord::new(0, 0), 0, false));

        // Tail leaves after one turn, the neck after two
        assert!(board.blocked(Coord::new(5, 7), 0, false));
        assert!(!board.blocked(Coord::new(5, 7), 1, false));
        assert!(board.blocked(Coord::new(5, 6), 1, false));
        assert!(!board.blocked(Coord::new(5, 6), 2, false));
    }

    #[test]
    fn test_eating_opponent_keeps_its_tail() {
        let config = no_decoys();
        // Food next to the opponent's head
        let s = state(11, 11, &[(0, 0), (0, 1)], &[&[(5, 5), (5, 6), (5, 7)]], &[(4, 5)]);
        let board = build_board(&s, &config);

        let tail = Coord::new(5, 7);
        assert!(board.blocked(tail, 1, false));
        // Opponent simulations ignore it
        assert!(!board.blocked(tail, 1, true));
    }

    #[test]
    fn test_short_own_tail_is_blocked() {
        let mut config = no_decoys();
        config.snake.min_length = 3;
        let s = state(11, 11, &[(5, 5), (5, 6)], &[], &[]);
        let board = build_board(&s, &config);
        assert!(board.blocked(Coord::new(5, 6), 1, false));

        config.snake.min_length = 2;
        let board = build_board(&s, &config);
        assert!(!board.blocked(Coord::new(5, 6), 1, false));
    }

    #[test]
    fn test_snakes_around_finds_enemy_heads_and_tails() {
        let config = no_decoys();
        let s = state(
            11,
            11,
            &[(5, 5), (5, 6)],
            &[&[(3, 4), (2, 4), (1, 4), (1, 5)]],
            &[],
        );
        let board = build_board(&s, &config);

        assert_eq!(board.snakes_around(Coord::new(3, 5), 0), vec![1]);
        assert_eq!(board.snakes_around(Coord::new(1, 6), 0), vec![1]);
        // Tail is gone after a turn
        assert!(board.snakes_around(Coord::new(1, 6), 1).is_empty());
        // Own head does not count, and body parts are ignored
        assert!(board.snakes_around(Coord::new(5, 4), 0).is_empty());
        assert!(board.snakes_around(Coord::new(2, 3), 0).is_empty());
    }

    #[test]
    fn test_borders_are_bumped() {
        let config = no_decoys();
        let s = state(5, 5, &[(2, 2)], &[], &[]);
        let board = build_board(&s, &config);

        assert_eq!(board.score(Coord::new(0, 0)), 10);
        assert_eq!(board.score(Coord::new(4, 2)), 10);
        assert_eq!(board.score(Coord::new(2, 4)), 10);
        assert_eq!(board.score(Coord::new(1, 1)), 0);
    }

    #[test]
    fn test_bump_score_around_skips_outside_cells() {
        let config = no_decoys();
        let s = state(5, 5, &[(2, 2)], &[], &[]);
        let mut board = build_board(&s, &config);

        board.bump_score_around(Coord::new(0, 2), 7);
        assert_eq!(board.score(Coord::new(0, 1)), 17);
        assert_eq!(board.score(Coord::new(0, 3)), 17);
        assert_eq!(board.score(Coord::new(1, 2)), 7);
        // The centre itself is untouched
        assert_eq!(board.score(Coord::new(0, 2)), 10);
    }

    #[test]
    fn test_connectivity_is_memoized_and_bounded() {
        let config = no_decoys();
        let s = state(11, 11, &[(10, 10), (10, 9)], &[], &[]);
        let mut board = build_board(&s, &config);

        let open = board.connectivity(Coord::new(1, 0));
        assert!(open > 0);
        assert!(open < 121);
        assert_eq!(board.connectivity(Coord::new(1, 0)), open);
        assert_eq!(board.connectivity(Coord::new(-1, 0)), 0);
    }

    #[test]
    fn test_connectivity_of_sealed_pocket_is_small() {
        let config = no_decoys();
        // (0,0) is enclosed by a long opponent body
        let s = state(
            11,
            11,
            &[(8, 8), (8, 9)],
            &[&[(1, 0), (1, 1), (0, 1), (0, 2), (0, 3), (0, 4)]],
            &[],
        );
        let mut board = build_board(&s, &config);
        assert_eq!(board.connectivity(Coord::new(0, 0)), 0);
    }

    #[test]
    fn test_step_limit_only_tightens() {
        let config = no_decoys();
        let s = state(11, 11, &[(5, 5)], &[], &[]);
        let mut board = build_board(&s, &config);
        assert_eq!(board.step_limit(), 50);
        board.tighten_step_limit(7);
        board.tighten_step_limit(20);
        assert_eq!(board.step_limit(), 7);
    }

    #[test]
    fn test_corners_on_tiny_board() {
        let config = no_decoys();
        let s = state(2, 2, &[(0, 0)], &[], &[]);
        let board = build_board(&s, &config);
        // (1,1), (1,0), (0,1), (0,0) all fit on a 2x2 board
        assert_eq!(board.corners().len(), 4);

        let s = state(1, 1, &[(0, 0)], &[], &[]);
        let board = build_board(&s, &config);
        assert!(board.corners().is_empty());
    }

    #[test]
    fn test_render_grid() {
        let config = no_decoys();
        let s = state(
            4,
            3,
            &[(0, 0), (1, 0)],
            &[&[(3, 2), (2, 2)]],
            &[(0, 2)],
        );
        let board = build_board(&s, &config);
        assert_eq!(board.to_string(), "Mm--\n----\nF-aA\n");
    }
}
