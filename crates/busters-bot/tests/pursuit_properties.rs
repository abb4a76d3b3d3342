use busters_bot::policy::{
    MovementHistory, Policy, PolicyContext, PolicyKind, PursuitBranch, PursuitPolicy,
};
use busters_bot::{AgentOptions, BustersAgent};
use busters_core::belief::InferenceRegistry;
use busters_core::model::direction::Direction;
use busters_core::model::layout::Layout;
use busters_core::model::view::GameView;
use busters_core::observation::EmissionKind;
use rand::SeedableRng;
use rand::rngs::StdRng;

const CORRIDOR: &str = "\
%%%%%%%%%
%P     G%
%%%% %%%%
%%%%G%%%%
%%%%%%%%%
";

fn layout() -> Layout {
    Layout::parse(CORRIDOR).expect("corridor layout")
}

fn view<'a>(
    layout: &'a Layout,
    facing: Direction,
    legal: &'a [Direction],
    distances: &'a [Option<u32>],
) -> GameView<'a> {
    GameView {
        layout,
        pacman_position: layout.pacman_start(),
        pacman_direction: facing,
        legal_actions: legal,
        living_ghosts: &[true, true],
        noisy_distances: &[None, None],
        ghost_distances: distances,
    }
}

fn primed(previous: &[Option<u32>]) -> PursuitPolicy {
    let mut history = MovementHistory::new();
    history.record(previous);
    PursuitPolicy::with_history(history)
}

#[test]
fn first_move_is_always_legal_across_seeds() {
    let layout = layout();
    let legals: [&[Direction]; 3] = [
        &[Direction::East, Direction::Stop],
        &[Direction::North, Direction::South, Direction::Stop],
        &[
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
            Direction::Stop,
        ],
    ];
    let distances = [Some(6), Some(4)];

    for legal in legals {
        let ctx = PolicyContext::new(view(&layout, Direction::Stop, legal, &distances));
        for seed in 0..1000u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut policy = PursuitPolicy::new();
            let action = policy.choose_action(&ctx, &mut rng).expect("legal move");
            assert!(legal.contains(&action), "seed {seed} produced {action}");
            assert!(action.is_cardinal());
            assert_eq!(policy.last_branch(), Some(PursuitBranch::NoHistory));
        }
    }
}

#[test]
fn improvement_selects_persist() {
    let layout = layout();
    let legal = [Direction::East, Direction::West, Direction::Stop];
    let current = [Some(3), None];
    let ctx = PolicyContext::new(view(&layout, Direction::West, &legal, &current));

    for seed in 0..100u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut policy = primed(&[Some(5), None]);
        assert_eq!(policy.choose_action(&ctx, &mut rng), Ok(Direction::West));
        assert_eq!(policy.last_branch(), Some(PursuitBranch::Persist));
    }
}

#[test]
fn regression_selects_evade_and_avoids_facing() {
    let layout = layout();
    let legal = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::Stop,
    ];
    let current = [Some(5)];
    let ctx = PolicyContext::new(view(&layout, Direction::South, &legal, &current));

    for seed in 0..500u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut policy = primed(&[Some(3)]);
        let action = policy.choose_action(&ctx, &mut rng).expect("legal move");
        assert_ne!(action, Direction::South);
        assert_ne!(action, Direction::Stop);
        assert_eq!(policy.last_branch(), Some(PursuitBranch::Evade));
    }
}

#[test]
fn all_missing_distances_never_raise() {
    let layout = layout();
    let legal = [Direction::East, Direction::Stop];
    let current = [None, None];
    let ctx = PolicyContext::new(view(&layout, Direction::East, &legal, &current));

    for seed in 0..100u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut policy = primed(&[None, None]);
        assert_eq!(policy.choose_action(&ctx, &mut rng), Ok(Direction::East));
        assert_eq!(policy.last_branch(), Some(PursuitBranch::NoHistory));
    }
}

#[test]
fn seeded_agents_replay_identically() {
    let layout = layout();
    let legal = layout.legal_actions(layout.pacman_start());
    let readings = [Some(6), Some(5)];
    let distances = [Some(6), Some(6)];
    let view = GameView {
        noisy_distances: &readings,
        ..view(&layout, Direction::Stop, &legal, &distances)
    };
    let options = AgentOptions {
        emission: EmissionKind::Sonar,
        ..AgentOptions::default()
    }
    .with_seed(99);
    let registry = InferenceRegistry::with_defaults();

    let run = || {
        let mut agent =
            BustersAgent::new(PolicyKind::Random.spawn(), 2, &options, &registry).expect("agent");
        agent.register_initial_state(&view);
        (0..20)
            .map(|_| agent.get_action(&view).expect("turn"))
            .collect::<Vec<_>>()
    };

    assert_eq!(run(), run());
}
