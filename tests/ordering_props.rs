// tests/ordering_props.rs

use proptest::prelude::*;
use vipser::{ExecutablePath, Operation};

#[derive(Debug, Clone)]
enum Step {
    Resize(i32, i32),
    Stretch(i32, i32),
    Expand(i32, i32),
    Extract(i32, i32, i32, i32),
    EmbedBlack(i32, i32, i32, i32),
    Blur(u16),
    Rotate(i32),
    Autorot,
    Quality(i32),
    Export(String),
}

impl Step {
    fn apply(&self, op: &mut Operation<'_>) {
        match self {
            Step::Resize(w, h) => op.resize(*w, *h),
            Step::Stretch(w, h) => op.stretch(*w, *h),
            Step::Expand(w, h) => op.expand(*w, *h),
            Step::Extract(l, t, w, h) => op.extract(*l, *t, *w, *h),
            Step::EmbedBlack(x, y, w, h) => op.embed_black(*x, *y, *w, *h),
            Step::Blur(tenths) => op.blur(f64::from(*tenths) / 10.0),
            Step::Rotate(a) => op.rotate(*a),
            Step::Autorot => op.autorot(),
            Step::Quality(q) => op.quality(*q),
            Step::Export(f) => op.format(f),
        };
    }

    fn expected(&self) -> String {
        match self {
            Step::Resize(w, h) => format!("RESIZE,{w},{h}"),
            Step::Stretch(w, h) => format!("STRETCH,{w},{h}"),
            Step::Expand(w, h) => format!("EXPAND,{w},{h}"),
            Step::Extract(l, t, w, h) => format!("EXTRACT,{l},{t},{w},{h}"),
            Step::EmbedBlack(x, y, w, h) => format!("EMBBLK,{x},{y},{w},{h}"),
            Step::Blur(tenths) => format!("BLUR,{}", f64::from(*tenths) / 10.0),
            Step::Rotate(a) => format!("ROTATE,{a}"),
            Step::Autorot => "AUTOROT".to_string(),
            Step::Quality(q) => format!("QUALITY,{q}"),
            Step::Export(f) => format!("EXPORT,{f}"),
        }
    }
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        (any::<i32>(), any::<i32>()).prop_map(|(w, h)| Step::Resize(w, h)),
        (any::<i32>(), any::<i32>()).prop_map(|(w, h)| Step::Stretch(w, h)),
        (any::<i32>(), any::<i32>()).prop_map(|(w, h)| Step::Expand(w, h)),
        (any::<i32>(), any::<i32>(), any::<i32>(), any::<i32>())
            .prop_map(|(l, t, w, h)| Step::Extract(l, t, w, h)),
        (any::<i32>(), any::<i32>(), any::<i32>(), any::<i32>())
            .prop_map(|(x, y, w, h)| Step::EmbedBlack(x, y, w, h)),
        any::<u16>().prop_map(Step::Blur),
        any::<i32>().prop_map(Step::Rotate),
        Just(Step::Autorot),
        (0..=100i32).prop_map(Step::Quality),
        "[a-z]{2,4}".prop_map(Step::Export),
    ]
}

proptest! {
    #[test]
    fn rendered_arguments_follow_call_order(steps in proptest::collection::vec(step_strategy(), 0..16)) {
        let mut op = Operation::with_executable(ExecutablePath::program("vipser"));
        for step in &steps {
            step.apply(&mut op);
        }

        let expected: Vec<String> = steps.iter().map(Step::expected).collect();
        prop_assert_eq!(op.render_arguments(), expected);
    }

    #[test]
    fn rendered_arguments_never_contain_spaces(steps in proptest::collection::vec(step_strategy(), 1..8)) {
        let mut op = Operation::with_executable(ExecutablePath::program("vipser"));
        for step in &steps {
            step.apply(&mut op);
        }

        for arg in op.render_arguments() {
            prop_assert!(!arg.contains(' '), "{}", arg);
        }
    }
}
