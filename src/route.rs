// Greedy route resolution
//
// A route walks from its origin towards one target, one step at a time,
// always taking the unblocked neighbour closest to the target. There is no
// backtracking: when every neighbour is blocked the route is unresolved.
// The accumulated raw score is normalised by path length plus the open
// space behind the first step, so short routes into open areas rank best.

use std::collections::HashSet;
use std::fmt;

use crate::board::Board;
use crate::types::{Coord, Direction};

/// What a route is aiming for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Food,
    Decoy,
    Corner,
    Tail,
    /// Escape check from a candidate's target back to the own tail
    BackRoute,
    /// An opponent's path towards food; writes danger scores
    Simulation { snake: usize },
}

impl RouteKind {
    pub fn is_simulation(&self) -> bool {
        matches!(self, RouteKind::Simulation { .. })
    }

    /// Whether the route competes for the next move
    pub fn is_candidate(&self) -> bool {
        matches!(
            self,
            RouteKind::Food | RouteKind::Decoy | RouteKind::Corner | RouteKind::Tail
        )
    }
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteKind::Food => f.write_str("food"),
            RouteKind::Decoy => f.write_str("decoy"),
            RouteKind::Corner => f.write_str("corner"),
            RouteKind::Tail => f.write_str("tail"),
            RouteKind::BackRoute => f.write_str("back"),
            RouteKind::Simulation { snake } => write!(f, "sim#{}", snake),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteStatus {
    Pending,
    /// Target reached
    Resolved,
    /// Ran out of options, or vetoed on the first step
    Unresolved,
    /// Hit the turn's step limit
    Aborted,
    /// Simulation lookahead exhausted
    Truncated,
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RouteStatus::Pending => "pending",
            RouteStatus::Resolved => "resolved",
            RouteStatus::Unresolved => "unresolved",
            RouteStatus::Aborted => "aborted",
            RouteStatus::Truncated => "truncated",
        };
        f.write_str(s)
    }
}

/// One step of a route
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Movement {
    pub direction: Direction,
    pub to: Coord,
    /// Euclidean distance from `to` to the route's target
    pub magnitude: f64,
    /// Magnitude plus the threat penalty the step was compared with
    pub weight: f64,
}

#[derive(Debug, Clone)]
pub struct Route {
    kind: RouteKind,
    origin: Coord,
    target: Coord,
    movements: Vec<Movement>,
    raw_score: i32,
    field_score: i32,
    status: RouteStatus,
    connectivity: usize,
    tail_reachable: Option<bool>,
    score: f64,
}

impl Route {
    pub fn new(kind: RouteKind, origin: Coord, target: Coord) -> Self {
        Route {
            kind,
            origin,
            target,
            movements: Vec::new(),
            raw_score: 0,
            field_score: 0,
            status: RouteStatus::Pending,
            connectivity: 0,
            tail_reachable: None,
            score: 0.0,
        }
    }

    /// Creates and resolves a route in one go
    pub fn resolved(kind: RouteKind, origin: Coord, target: Coord, board: &mut Board) -> Self {
        let mut route = Route::new(kind, origin, target);
        route.resolve(board);
        route
    }

    /// Walks the route against `board`.
    ///
    /// Simulations write their danger into the board's cell scores; every
    /// other route that reaches its target, back-routes included, tightens the
    /// board's step limit.
    pub fn resolve(&mut self, board: &mut Board) {
        let config = board.config();
        let scores = &config.scores;
        let simulation = self.kind.is_simulation();

        let mut visited = HashSet::from([self.origin]);

        if let RouteKind::Simulation { snake } = self.kind {
            if board.food_around(self.origin) {
                let tail = board.snakes()[snake].tail();
                board.bump_score(tail, scores.opponent_food_tail_bump);
            }
        }

        let mut current = self.origin;
        self.status = loop {
            let step = self.movements.len();
            let threats = if !simulation && step < config.route.best_move_selection {
                board.snakes_around(current, step).len() as f64
            } else {
                0.0
            };

            let mut best: Option<Movement> = None;
            for direction in Direction::all() {
                let to = direction.apply(&current);
                if visited.contains(&to) || board.blocked(to, step, simulation) {
                    continue;
                }
                let magnitude = to.distance(&self.target);
                if !simulation {
                    let cell_score = board.score(to);
                    self.raw_score += cell_score;
                    self.field_score += cell_score;
                }
                let weight = magnitude + threats;
                if best.map_or(true, |b| weight < b.weight) {
                    best = Some(Movement { direction, to, magnitude, weight });
                }
            }

            let Some(movement) = best else {
                self.raw_score += scores.unresolved_bump;
                break RouteStatus::Unresolved;
            };

            current = movement.to;
            if simulation {
                board.bump_score(current, 1);
            }
            self.movements.push(movement);
            visited.insert(current);
            let steps = self.movements.len();
            self.raw_score += steps as i32;

            if !simulation {
                let around = board.snakes_around(current, steps);
                self.raw_score += scores.snake_around_bump * around.len() as i32;
                let my_length = board.me().len();
                // Head-to-head we would lose or draw
                if steps == 1 && around.iter().any(|&i| board.snakes()[i].len() >= my_length) {
                    self.raw_score += scores.direct_neighbor_bump;
                    break RouteStatus::Unresolved;
                }
            }

            if movement.magnitude == 0.0 {
                break RouteStatus::Resolved;
            }

            if simulation {
                for m in &self.movements {
                    board.bump_score(m.to, scores.opponent_path_bump);
                }
                if steps >= config.route.opponent_max_steps {
                    break RouteStatus::Truncated;
                }
            }

            if steps >= board.step_limit() {
                break RouteStatus::Aborted;
            }
        };

        self.finish(board);
    }

    fn finish(&mut self, board: &mut Board) {
        let config = board.config();

        if self.status == RouteStatus::Resolved && !self.kind.is_simulation() {
            board.tighten_step_limit(self.steps());
        }

        if let Some(first) = self.movements.first() {
            self.connectivity = board.connectivity(first.to);
        }

        if self.kind.is_candidate() && self.status != RouteStatus::Unresolved {
            let tail = board.me().tail();
            let back = Route::resolved(RouteKind::BackRoute, self.target, tail, board);
            let reachable = back.status != RouteStatus::Unresolved
                || back.steps() > config.route.min_backroute_steps;
            if !reachable {
                self.raw_score += config.scores.unavailable_tail_bump;
            }
            self.tail_reachable = Some(reachable);
        }

        let denominator = (self.steps() + self.connectivity).max(1);
        self.score = self.raw_score as f64 / denominator as f64;
    }

    pub fn kind(&self) -> RouteKind {
        self.kind
    }

    pub fn origin(&self) -> Coord {
        self.origin
    }

    pub fn target(&self) -> Coord {
        self.target
    }

    pub fn movements(&self) -> &[Movement] {
        &self.movements
    }

    pub fn steps(&self) -> usize {
        self.movements.len()
    }

    pub fn first_step(&self) -> Option<Direction> {
        self.movements.first().map(|m| m.direction)
    }

    pub fn status(&self) -> RouteStatus {
        self.status
    }

    pub fn is_resolved(&self) -> bool {
        self.status == RouteStatus::Resolved
    }

    pub fn is_unresolved(&self) -> bool {
        self.status == RouteStatus::Unresolved
    }

    pub fn is_aborted(&self) -> bool {
        self.status == RouteStatus::Aborted
    }

    pub fn raw_score(&self) -> i32 {
        self.raw_score
    }

    /// Sum of the cell scores examined while resolving
    pub fn field_score(&self) -> i32 {
        self.field_score
    }

    pub fn connectivity(&self) -> usize {
        self.connectivity
    }

    /// Set for candidate routes that got anywhere
    pub fn tail_reachable(&self) -> Option<bool> {
        self.tail_reachable
    }

    /// Normalised score, lower is better
    pub fn score(&self) -> f64 {
        self.score
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} {} steps={} first={} raw={} field={} conn={} score={:.3}",
            self.kind,
            self.origin,
            self.target,
            self.status,
            self.steps(),
            self.first_step().map_or("-", |d| d.as_str()),
            self.raw_score,
            self.field_score,
            self.connectivity,
            self.score,
        )?;
        if let Some(reachable) = self.tail_reachable {
            write!(f, " tail={}", reachable)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::types::{Battlesnake, Game, GameState};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn body(cells: &[(i32, i32)]) -> Vec<Coord> {
        cells.iter().map(|&p| p.into()).collect()
    }

    fn state(me: &[(i32, i32)], health: i32, others: &[Vec<(i32, i32)>], food: &[(i32, i32)]) -> GameState {
        let you = Battlesnake::new("me", health, body(me));
        let mut snakes = vec![you.clone()];
        for (i, other) in others.iter().enumerate() {
            snakes.push(Battlesnake::new(&format!("other-{}", i), 100, body(other)));
        }
        GameState {
            game: Game::default(),
            turn: 1,
            board: crate::types::Board {
                width: 11,
                height: 11,
                food: body(food),
                snakes,
                hazards: vec![],
            },
            you,
        }
    }

    fn config() -> Config {
        let mut config = Config::default_hardcoded();
        config.targets.decoy_count = 0;
        config
    }

    fn build_board<'a>(state: &GameState, config: &'a Config) -> Board<'a> {
        let mut rng = StdRng::seed_from_u64(0);
        Board::new(state, config, &mut rng).unwrap()
    }

    #[test]
    fn test_open_route_goes_straight() {
        let config = config();
        let s = state(&[(10, 10), (10, 9)], 100, &[], &[]);
        let mut board = build_board(&s, &config);

        let route = Route::resolved(RouteKind::Food, Coord::new(0, 0), Coord::new(3, 0), &mut board);

        assert!(route.is_resolved());
        assert!(!route.is_unresolved());
        assert_eq!(route.steps(), 3);
        assert!(route.movements().iter().all(|m| m.direction == Direction::Right));
        assert_eq!(route.movements().last().unwrap().to, Coord::new(3, 0));
        assert_eq!(route.raw_score(), 46);
        assert_eq!(route.connectivity(), 43);
        assert_eq!(route.score(), 1.0);
        // A resolved candidate bounds every later route
        assert_eq!(board.step_limit(), 3);
    }

    #[test]
    fn test_route_aborts_at_step_limit() {
        let mut config = config();
        config.route.step_limit = 4;
        let s = state(&[(10, 10), (10, 9)], 100, &[], &[]);
        let mut board = build_board(&s, &config);

        let route = Route::resolved(RouteKind::Food, Coord::new(0, 0), Coord::new(8, 0), &mut board);

        assert!(route.is_aborted());
        assert_eq!(route.steps(), 4);
        // Step counts and border cells only; hitting the limit adds no penalty
        assert_eq!(route.raw_score(), 60);
        assert_eq!(route.tail_reachable(), Some(true));
        assert_eq!(board.step_limit(), 4);
    }

    #[test]
    fn test_back_route_to_tail_tightens_step_limit() {
        let config = config();
        let s = state(
            &[(1, 8), (1, 9), (2, 9), (3, 9), (4, 9), (5, 9), (5, 8), (5, 7)],
            100,
            &[],
            &[(4, 8)],
        );
        let mut board = build_board(&s, &config);

        let route = Route::resolved(RouteKind::Food, Coord::new(1, 8), Coord::new(4, 8), &mut board);

        assert!(route.is_resolved());
        assert_eq!(route.steps(), 3);
        assert_eq!(route.tail_reachable(), Some(true));
        // (4,8) -> (4,7) -> tail at (5,7) is shorter than the food route
        assert_eq!(board.step_limit(), 2);
    }

    #[test]
    fn test_walled_off_target_is_unresolved() {
        let config = config();
        let mut wall = vec![(1, 0), (1, 1), (0, 1)];
        wall.extend((2..11).map(|y| (0, y)));
        wall.extend((1..8).map(|x| (x, 10)));
        let s = state(&[(5, 5), (5, 6), (5, 7)], 100, &[wall], &[]);
        let mut board = build_board(&s, &config);

        let route = Route::resolved(RouteKind::Corner, Coord::new(5, 5), Coord::new(0, 0), &mut board);

        assert!(route.is_unresolved());
        assert!(route.steps() <= config.route.step_limit);
        assert_eq!(route.steps(), 16);
        assert_eq!(route.raw_score(), 501);
        assert!(route.raw_score() >= config.scores.unresolved_bump);
        // Unresolved routes skip the escape check
        assert_eq!(route.tail_reachable(), None);
        assert_eq!(board.step_limit(), 50);
    }

    fn trapped_food_state() -> GameState {
        state(
            &[(1, 4), (1, 5), (1, 6)],
            10,
            &[vec![(4, 0), (3, 0), (2, 0), (2, 1), (1, 1), (0, 1)]],
            &[(0, 0)],
        )
    }

    #[test]
    fn test_trapped_destination_is_penalized() {
        let config = config();
        let s = trapped_food_state();
        let mut board = build_board(&s, &config);
        let trapped = Route::resolved(RouteKind::Food, Coord::new(1, 4), Coord::new(0, 0), &mut board);

        assert!(trapped.is_resolved());
        assert_eq!(trapped.steps(), 5);
        assert_eq!(trapped.first_step(), Some(Direction::Up));
        assert_eq!(trapped.tail_reachable(), Some(false));
        assert_eq!(trapped.raw_score(), 135);

        let mut lenient = config.clone();
        lenient.route.min_backroute_steps = 0;
        let mut board = build_board(&s, &lenient);
        let open = Route::resolved(RouteKind::Food, Coord::new(1, 4), Coord::new(0, 0), &mut board);

        assert_eq!(open.tail_reachable(), Some(true));
        assert_eq!(open.raw_score(), 85);
        assert_eq!(trapped.raw_score() - open.raw_score(), config.scores.unavailable_tail_bump);
        assert!(trapped.score() > open.score());
    }

    #[test]
    fn test_simulation_writes_danger() {
        let config = config();
        let s = state(&[(10, 10), (10, 9)], 100, &[vec![(3, 3), (3, 4), (3, 5)]], &[(3, 1)]);
        let mut board = build_board(&s, &config);

        let route = Route::resolved(
            RouteKind::Simulation { snake: 1 },
            Coord::new(3, 3),
            Coord::new(3, 1),
            &mut board,
        );

        assert!(route.is_resolved());
        assert_eq!(route.steps(), 2);
        // Landing bump plus path bump on the first cell, landing bump only on the target
        assert_eq!(board.score(Coord::new(3, 2)), 6);
        assert_eq!(board.score(Coord::new(3, 1)), 1);
        // Simulations never tighten the limit nor check for escape
        assert_eq!(board.step_limit(), 50);
        assert_eq!(route.tail_reachable(), None);
    }

    #[test]
    fn test_simulation_about_to_eat_marks_its_tail() {
        let config = config();
        let s = state(&[(10, 10), (10, 9)], 100, &[vec![(3, 3), (3, 4), (3, 5)]], &[(3, 2)]);
        let mut board = build_board(&s, &config);

        Route::resolved(
            RouteKind::Simulation { snake: 1 },
            Coord::new(3, 3),
            Coord::new(3, 2),
            &mut board,
        );

        assert_eq!(board.score(Coord::new(3, 5)), 100);
    }

    #[test]
    fn test_simulation_is_truncated() {
        let config = config();
        let s = state(&[(10, 10), (10, 9)], 100, &[vec![(5, 1), (5, 0)]], &[(5, 9)]);
        let mut board = build_board(&s, &config);

        let route = Route::resolved(
            RouteKind::Simulation { snake: 1 },
            Coord::new(5, 1),
            Coord::new(5, 9),
            &mut board,
        );

        assert_eq!(route.status(), RouteStatus::Truncated);
        assert_eq!(route.steps(), config.route.opponent_max_steps);
    }

    #[test]
    fn test_head_to_head_veto_on_first_step() {
        let config = config();
        // A longer opponent's head sits next to (5,4)
        let s = state(
            &[(5, 5), (5, 6)],
            100,
            &[vec![(4, 4), (3, 4), (2, 4)]],
            &[],
        );
        let mut board = build_board(&s, &config);

        let route = Route::resolved(RouteKind::Corner, Coord::new(5, 5), Coord::new(5, 1), &mut board);

        assert!(route.is_unresolved());
        assert_eq!(route.steps(), 1);
        assert_eq!(route.first_step(), Some(Direction::Up));
    }

    #[test]
    fn test_display_summarizes_route() {
        let config = config();
        let s = state(&[(10, 10), (10, 9)], 100, &[], &[]);
        let mut board = build_board(&s, &config);
        let route = Route::resolved(RouteKind::Food, Coord::new(0, 0), Coord::new(3, 0), &mut board);

        let line = route.to_string();
        assert!(line.starts_with("food (0, 0) -> (3, 0) resolved steps=3 first=right"));
        assert!(line.ends_with("tail=true"));
    }
}
