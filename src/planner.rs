// Route set builder and move selector
//
// One turn: simulate every opponent towards every food item so their likely
// paths become expensive, then resolve the own candidate routes against the
// resulting score overlay and take the first step of the cheapest one.

use log::debug;
use rand::Rng;
use std::cmp::Ordering;

use crate::board::Board;
use crate::config::Config;
use crate::error::MalformedState;
use crate::route::{Route, RouteKind};
use crate::types::{Coord, Direction, GameState};

/// All routes resolved during one turn
#[derive(Debug, Clone, Default)]
pub struct RouteSet {
    simulations: Vec<Route>,
    /// Ranked, best first
    candidates: Vec<Route>,
}

impl RouteSet {
    /// Runs the opponent simulations and resolves and ranks the own routes.
    pub fn build(board: &mut Board) -> Self {
        let simulations = simulate_opponents(board);
        let mut candidates = candidate_routes(board);
        rank(&mut candidates);
        RouteSet { simulations, candidates }
    }

    pub fn simulations(&self) -> &[Route] {
        &self.simulations
    }

    pub fn candidates(&self) -> &[Route] {
        &self.candidates
    }

    /// The lowest scoring candidate
    pub fn best(&self) -> Option<&Route> {
        self.candidates.first()
    }
}

/// Opponent paths towards food. Each opponent's head surroundings are marked
/// dangerous after its simulations.
fn simulate_opponents(board: &mut Board) -> Vec<Route> {
    let config = board.config();
    let opponents: Vec<(usize, Coord)> = board.opponents().map(|(i, s)| (i, s.head())).collect();
    let food = board.food().to_vec();

    let mut routes = Vec::with_capacity(opponents.len() * food.len());
    for (snake, head) in opponents {
        for &target in &food {
            routes.push(Route::resolved(RouteKind::Simulation { snake }, head, target, board));
        }
        board.bump_score_around(head, config.scores.opponent_head_bump);
    }
    routes
}

/// Food routes always; decoy and corner routes only while not starving.
fn candidate_routes(board: &mut Board) -> Vec<Route> {
    let config = board.config();
    let targets = &config.targets;
    let head = board.me().head();

    let mut plan: Vec<(RouteKind, Coord)> =
        board.food().iter().map(|&p| (RouteKind::Food, p)).collect();

    if board.me().health > config.snake.health_critical {
        if targets.decoys_enabled {
            plan.extend(board.decoys().iter().map(|&p| (RouteKind::Decoy, p)));
        }
        if targets.corners_enabled {
            plan.extend(board.corners().into_iter().map(|p| (RouteKind::Corner, p)));
        }
    }

    if targets.tail_route_enabled && board.me().len() >= targets.tail_route_min_length {
        plan.push((RouteKind::Tail, board.me().tail()));
    }

    plan.into_iter()
        .map(|(kind, target)| Route::resolved(kind, head, target, board))
        .collect()
}

/// Stable ascending sort by normalised score
fn rank(routes: &mut [Route]) {
    routes.sort_by(|a, b| a.score().partial_cmp(&b.score()).unwrap_or(Ordering::Equal));
}

/// Picks the move for the turn: the first step of the best route, otherwise
/// the first free neighbour, otherwise anything on the board.
pub fn select_move(board: &Board, routes: &RouteSet) -> Direction {
    if let Some(direction) = routes.best().and_then(Route::first_step) {
        return direction;
    }

    let head = board.me().head();
    let all = Direction::all();
    all.iter()
        .find(|d| !board.blocked(d.apply(&head), 0, false))
        .or_else(|| all.iter().find(|d| board.in_bounds(d.apply(&head))))
        .copied()
        .unwrap_or_default()
}

/// Outcome of one turn's analysis
#[derive(Debug, Clone)]
pub struct Decision {
    pub direction: Direction,
    pub routes: RouteSet,
    /// The occupancy map as rendered after all routes were resolved
    pub grid: String,
}

impl Decision {
    pub fn best_route(&self) -> Option<&Route> {
        self.routes.best()
    }
}

/// Analyses one turn and keeps the full route set for diagnostics.
///
/// # Arguments
/// * `state` - Decoded move request
/// * `config` - Tuning constants
/// * `rng` - Randomness for decoy selection; seed it for reproducible turns
///
/// # Returns
/// * `Result<Decision, MalformedState>` - The chosen move and how it was reached
pub fn plan<R: Rng + ?Sized>(
    state: &GameState,
    config: &Config,
    rng: &mut R,
) -> Result<Decision, MalformedState> {
    let mut board = Board::new(state, config, rng)?;
    let routes = RouteSet::build(&mut board);

    for route in routes.simulations().iter().chain(routes.candidates()) {
        debug!("{}", route);
    }
    let grid = board.to_string();
    debug!("Turn {} map:\n{}", state.turn, grid);

    let direction = select_move(&board, &routes);
    Ok(Decision { direction, routes, grid })
}

/// Decides the next move for the snake identified by `state.you`.
pub fn decide_move<R: Rng + ?Sized>(
    state: &GameState,
    config: &Config,
    rng: &mut R,
) -> Result<Direction, MalformedState> {
    plan(state, config, rng).map(|decision| decision.direction)
}
