//! End-to-end scenarios exercising the public API the way an embedder would:
//! author a tree, tick it through an `Executor`, inspect `State` and leaf
//! side effects.

use std::cell::RefCell;
use std::rc::Rc;

use mashina_rs::{DefaultHost, Executor, Host, Local, Node, Reference, Status, Tree};

fn test_setup() {
    let _ = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

fn host() -> Rc<dyn Host> {
    Rc::new(DefaultHost::new())
}

#[derive(Debug, Clone)]
struct ScriptedLeaf {
    status: Status,
    ticked: Rc<RefCell<bool>>,
}

impl ScriptedLeaf {
    fn new(status: Status) -> (Self, Rc<RefCell<bool>>) {
        let ticked = Rc::new(RefCell::new(false));
        (ScriptedLeaf { status, ticked: ticked.clone() }, ticked)
    }
}

impl Node for ScriptedLeaf {
    fn update(&mut self, _executor: &mut Executor) -> Status {
        *self.ticked.borrow_mut() = true;
        self.status
    }
}

// A Sequence stops at the first child that doesn't succeed and never ticks
// anything after it.
#[test]
fn sequence_short_circuits() {
    test_setup();
    let host = host();
    let tree = Tree::new(host.clone());
    let root = tree.borrow_mut().root::<mashina_rs::nodes::Sequence>();

    let (ok, ok_ticked) = ScriptedLeaf::new(Status::Success);
    let (stop, stop_ticked) = ScriptedLeaf::new(Status::Failure);
    let (never, never_ticked) = ScriptedLeaf::new(Status::Success);

    tree.borrow_mut().child_with(root, ok);
    tree.borrow_mut().child_with(root, stop);
    tree.borrow_mut().child_with(root, never);

    let mut executor = Executor::new(host);
    assert_eq!(Tree::execute(&tree, &mut executor), Status::Failure);

    assert!(*ok_ticked.borrow());
    assert!(*stop_ticked.borrow());
    assert!(!*never_ticked.borrow());
}

// A Selector stops at the first child that doesn't fail and never ticks
// anything after it.
#[test]
fn selector_recovers_on_first_non_failure() {
    test_setup();
    let host = host();
    let tree = Tree::new(host.clone());
    let root = tree.borrow_mut().root::<mashina_rs::nodes::Selector>();

    let (fails, fails_ticked) = ScriptedLeaf::new(Status::Failure);
    let (working, working_ticked) = ScriptedLeaf::new(Status::Working);
    let (never, never_ticked) = ScriptedLeaf::new(Status::Success);

    tree.borrow_mut().child_with(root, fails);
    tree.borrow_mut().child_with(root, working);
    tree.borrow_mut().child_with(root, never);

    let mut executor = Executor::new(host);
    assert_eq!(Tree::execute(&tree, &mut executor), Status::Working);

    assert!(*fails_ticked.borrow());
    assert!(*working_ticked.borrow());
    assert!(!*never_ticked.borrow());
}

// Invert swaps Success/Failure but passes Working through unchanged.
#[test]
fn invert_passes_working_through() {
    test_setup();
    let host = host();
    let tree = Tree::new(host.clone());
    let root = tree.borrow_mut().root::<mashina_rs::nodes::Invert>();
    let (working, _) = ScriptedLeaf::new(Status::Working);
    tree.borrow_mut().child_with(root, working);

    let mut executor = Executor::new(host);
    assert_eq!(Tree::execute(&tree, &mut executor), Status::Working);
}

// Input/output wiring round-trip: two locals (x, y) and two internally-named
// slots (internal_in, internal_out) used purely as wire endpoints, unset
// once the node that owns them leaves.
#[derive(Debug)]
struct WriteLeaf {
    out: Reference<i32>,
}

impl Node for WriteLeaf {
    fn update(&mut self, executor: &mut Executor) -> Status {
        executor.state_mut().set(&self.out, 7);
        Status::Success
    }
}

#[derive(Debug)]
struct ReadLeaf {
    input: Reference<i32>,
    out: Reference<i32>,
}

impl Node for ReadLeaf {
    fn update(&mut self, executor: &mut Executor) -> Status {
        let seen = executor.state().get(&self.input);
        assert_eq!(seen, 7);
        executor.state_mut().set(&self.out, seen * 2);
        Status::Success
    }
}

#[test]
fn wiring_round_trip() {
    test_setup();
    use mashina_rs::Slot;

    let host = host();
    let tree = Tree::new(host.clone());
    let root = tree.borrow_mut().root::<mashina_rs::nodes::Sequence>();

    let x = tree.borrow_mut().local::<i32>(Some("x"));
    let y = tree.borrow_mut().local::<i32>(Some("y"));

    let internal_out = Reference::<i32>::new(host.as_ref(), Some("internal_out"));
    let internal_in = Reference::<i32>::new(host.as_ref(), Some("internal_in"));

    let write = tree.borrow_mut().child_with(root, WriteLeaf { out: internal_out });
    tree.borrow_mut().output(write, internal_out.slot_id(), x.slot_id());

    let read = tree.borrow_mut().child_with(
        root,
        ReadLeaf { input: internal_in, out: internal_out },
    );
    tree.borrow_mut().input(read, x.slot_id(), internal_in.slot_id());
    tree.borrow_mut().output(read, internal_out.slot_id(), y.slot_id());

    let mut executor = Executor::new(host);
    assert_eq!(Tree::execute(&tree, &mut executor), Status::Success);

    assert_eq!(executor.state().get(&x), 7);
    assert_eq!(executor.state().get(&y), 14);
    assert!(!executor.state().has(&internal_in));
    assert!(!executor.state().has(&internal_out));
}

// A tree's constants are copied from the tree's authored values at the start
// of every execute, so mutations a previous tick made to a constant's state
// slot never leak into the next tick.
#[derive(Debug)]
struct MutateConstant {
    constant: Local<i32>,
}

impl Node for MutateConstant {
    fn update(&mut self, executor: &mut Executor) -> Status {
        let seen = executor.state().get(&self.constant);
        executor.state_mut().set(&self.constant, seen + 100);
        Status::Success
    }
}

#[test]
fn constants_are_recopied_on_every_execute() {
    test_setup();
    let host = host();
    let tree = Tree::new(host.clone());
    let root = tree.borrow_mut().root::<mashina_rs::nodes::Sequence>();
    let constant = tree.borrow_mut().constant::<i32>(42);
    tree.borrow_mut().child_with(root, MutateConstant { constant });

    let mut executor = Executor::new(host);

    assert_eq!(Tree::execute(&tree, &mut executor), Status::Success);
    assert_eq!(executor.state().get(&constant), 142);

    // The leaf mutated the constant's slot to 142 last tick; a fresh execute
    // still starts from the authored value of 42, not the mutated 142.
    assert_eq!(Tree::execute(&tree, &mut executor), Status::Success);
    assert_eq!(executor.state().get(&constant), 142);
}

#[derive(Debug)]
struct Tracked {
    activations: Rc<RefCell<u32>>,
    deactivations: Rc<RefCell<u32>>,
}

impl Node for Tracked {
    fn update(&mut self, _executor: &mut Executor) -> Status {
        Status::Working
    }

    fn activated(&mut self, _executor: &mut Executor) {
        *self.activations.borrow_mut() += 1;
    }

    fn deactivated(&mut self, _executor: &mut Executor) {
        *self.deactivations.borrow_mut() += 1;
    }
}

// A leaf can close its own activation span from inside `update` by calling
// `deactivate`, rather than waiting for the executor to notice abandonment
// on a later tick.
#[derive(Debug)]
struct SelfDeactivatingLeaf {
    done: Rc<RefCell<bool>>,
    activations: Rc<RefCell<u32>>,
    deactivations: Rc<RefCell<u32>>,
}

impl Node for SelfDeactivatingLeaf {
    fn update(&mut self, executor: &mut Executor) -> Status {
        if *self.done.borrow() {
            self.deactivate(executor);
            Status::Success
        } else {
            Status::Working
        }
    }

    fn activated(&mut self, _executor: &mut Executor) {
        *self.activations.borrow_mut() += 1;
    }

    fn deactivated(&mut self, _executor: &mut Executor) {
        *self.deactivations.borrow_mut() += 1;
    }
}

#[test]
fn leaf_can_deactivate_itself_cooperatively() {
    test_setup();
    let host = host();
    let tree = Tree::new(host.clone());
    let root = tree.borrow_mut().root::<mashina_rs::nodes::Sequence>();

    let done = Rc::new(RefCell::new(false));
    let activations = Rc::new(RefCell::new(0));
    let deactivations = Rc::new(RefCell::new(0));
    tree.borrow_mut().child_with(
        root,
        SelfDeactivatingLeaf {
            done: done.clone(),
            activations: activations.clone(),
            deactivations: deactivations.clone(),
        },
    );

    let mut executor = Executor::new(host);

    assert_eq!(Tree::execute(&tree, &mut executor), Status::Working);
    assert_eq!(*activations.borrow(), 1);
    assert_eq!(*deactivations.borrow(), 0);

    *done.borrow_mut() = true;
    assert_eq!(Tree::execute(&tree, &mut executor), Status::Success);
    assert_eq!(*activations.borrow(), 1);
    assert_eq!(*deactivations.borrow(), 1);

    // The leaf cleared its own visited flag when it deactivated, so being
    // reached again re-activates it even though its frame was reused rather
    // than truncated.
    assert_eq!(Tree::execute(&tree, &mut executor), Status::Success);
    assert_eq!(*activations.borrow(), 2);
    assert_eq!(*deactivations.borrow(), 2);
}

// A branch reached one tick but not the next is deactivated exactly once,
// when its retained frame is truncated on the tick that abandons it.
#[derive(Debug)]
struct Toggle {
    status: Rc<RefCell<Status>>,
}

impl Node for Toggle {
    fn update(&mut self, _executor: &mut Executor) -> Status {
        *self.status.borrow()
    }
}

#[test]
fn abandonment_triggers_deactivation() {
    test_setup();
    let host = host();
    let tree = Tree::new(host.clone());
    let root = tree.borrow_mut().root::<mashina_rs::nodes::Selector>();

    let a_status = Rc::new(RefCell::new(Status::Failure));
    tree.borrow_mut().child_with(root, Toggle { status: a_status.clone() });

    let b_activations = Rc::new(RefCell::new(0));
    let b_deactivations = Rc::new(RefCell::new(0));
    tree.borrow_mut().child_with(
        root,
        Tracked {
            activations: b_activations.clone(),
            deactivations: b_deactivations.clone(),
        },
    );

    let mut executor = Executor::new(host);

    assert_eq!(Tree::execute(&tree, &mut executor), Status::Working);
    assert_eq!(*b_activations.borrow(), 1);
    assert_eq!(*b_deactivations.borrow(), 0);

    *a_status.borrow_mut() = Status::Success;
    assert_eq!(Tree::execute(&tree, &mut executor), Status::Success);
    assert_eq!(*b_deactivations.borrow(), 1);

    // A third tick with A still succeeding keeps B uninvolved; no further
    // deactivation fires for an already-collapsed frame.
    assert_eq!(Tree::execute(&tree, &mut executor), Status::Success);
    assert_eq!(*b_deactivations.borrow(), 1);
}

// Sub-tree channel assignment: a channel's proxy node dispatches to whatever
// sub-tree is currently assigned to it, and reassigning it changes what the
// next tick dispatches to.
#[test]
fn channel_assignment_and_reassignment() {
    test_setup();
    let host = host();
    let parent = Tree::new(host.clone());
    let root = parent.borrow_mut().root::<mashina_rs::nodes::Sequence>();
    let channel = mashina_rs::ChannelId(1);
    parent.borrow_mut().child_channel(root, channel);
    let (tail, tail_ticked) = ScriptedLeaf::new(Status::Success);
    parent.borrow_mut().child_with(root, tail);

    let failing_subtree = Tree::new(host.clone());
    let (fail_leaf, _) = ScriptedLeaf::new(Status::Failure);
    failing_subtree.borrow_mut().root_with(fail_leaf);
    parent.borrow_mut().assign(channel, failing_subtree);

    let mut executor = Executor::new(host.clone());
    assert_eq!(Tree::execute(&parent, &mut executor), Status::Failure);
    assert!(!*tail_ticked.borrow());

    let succeeding_subtree = Tree::new(host.clone());
    let (ok_leaf, _) = ScriptedLeaf::new(Status::Success);
    succeeding_subtree.borrow_mut().root_with(ok_leaf);
    parent.borrow_mut().assign(channel, succeeding_subtree);

    assert_eq!(Tree::execute(&parent, &mut executor), Status::Success);
    assert!(*tail_ticked.borrow());
}

// A composite that visits a child without ticking it (via `Executor::visit`,
// used by custom composites that traverse for inspection purposes rather
// than execution) still drives that child's activation lifecycle, but never
// calls its `update`.
#[derive(Debug, Default)]
struct Peek;

impl Node for Peek {
    fn update(&mut self, executor: &mut Executor) -> Status {
        if let Some(&child) = executor.current_children().first() {
            executor.visit(child);
        }
        Status::Success
    }
}

#[derive(Debug)]
struct PanicsIfTicked {
    activations: Rc<RefCell<u32>>,
}

impl Node for PanicsIfTicked {
    fn update(&mut self, _executor: &mut Executor) -> Status {
        panic!("a visited node must not be ticked");
    }

    fn activated(&mut self, _executor: &mut Executor) {
        *self.activations.borrow_mut() += 1;
    }
}

#[test]
fn visit_marks_a_node_active_without_ticking_it() {
    test_setup();
    let host = host();
    let tree = Tree::new(host.clone());
    let root = tree.borrow_mut().root::<Peek>();
    let activations = Rc::new(RefCell::new(0));
    tree.borrow_mut().child_with(root, PanicsIfTicked { activations: activations.clone() });

    let mut executor = Executor::new(host);
    assert_eq!(Tree::execute(&tree, &mut executor), Status::Success);
    assert_eq!(*activations.borrow(), 1);
}

// Dropping the executor mid-tree deactivates every activated node exactly
// once, the same as an abandoned branch would on a later tick.
#[test]
fn dropping_executor_deactivates_active_nodes() {
    test_setup();
    let host = host();
    let tree = Tree::new(host.clone());
    let root = tree.borrow_mut().root::<mashina_rs::nodes::Sequence>();

    let activations = Rc::new(RefCell::new(0));
    let deactivations = Rc::new(RefCell::new(0));
    tree.borrow_mut().child_with(
        root,
        Tracked {
            activations: activations.clone(),
            deactivations: deactivations.clone(),
        },
    );

    let mut executor = Executor::new(host);
    assert_eq!(Tree::execute(&tree, &mut executor), Status::Working);
    assert_eq!(*activations.borrow(), 1);
    assert_eq!(*deactivations.borrow(), 0);

    drop(executor);
    assert_eq!(*deactivations.borrow(), 1);
}
