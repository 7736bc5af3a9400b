//! # Ending 模块
//!
//! 结局演出控制器。
//!
//! ## 执行模型
//!
//! ```text
//! trigger(ctx)          tick(dt, ctx) × N                      Completed
//!   │ HUD 关闭            │ 推进当前阶段（淡变 / 定时等待 / 轮询）   │ load_screen()
//!   │ BGM 淡出            │ 阶段结束后立即进入下一阶段
//! ```
//!
//! 每个阶段要么是瞬时动作，要么占用时间：
//! - 淡变：由 [`Fade`] 驱动一个画面元素，结束时精确落在目标值
//! - 定时等待：独立计时，与 BGM 的淡入淡出互不同步
//! - 轮询：每个 tick 询问对话系统一次，条件满足才继续
//!
//! 瞬时动作、时长为 0 的淡变和已满足的轮询在同一个 tick 内连续执行；
//! 占用时间的阶段从下一个 tick 开始消耗时间，阶段结束时多出的时间丢弃。
//!
//! 演出一旦触发就会执行到底，没有取消路径。

mod phase;

pub use phase::{EndingPhase, SequenceState};

use tracing::{debug, info};

use crate::audio::SoundService;
use crate::camera::CameraRig;
use crate::config::EndingConfig;
use crate::fade::Fade;
use crate::host::{DialogueRunner, HudControls, PlayerControl, ScreenLoader};
use crate::stage::{EndingStage, Overlay};

/// 结局对话节点
pub const ENDING_NODE: &str = "Ending";

/// 解说对话节点
pub const DESCRIPTION_NODE: &str = "Description";

/// 演出结束后切换到的场景
pub const NEXT_SCREEN: &str = "ScenarioSelect";

/// 结局 BGM 淡入时长（秒）
const MUSIC_FADE_IN: f32 = 2.0;

/// 开始播放结局 BGM 后的等待时长（秒）
const MUSIC_LEAD_IN: f32 = 2.0;

/// 解说面板与 END 文字的淡变时长（秒）
const PANEL_FADE: f32 = 0.5;

/// 最终 BGM 淡出时长（秒）
const MUSIC_FADE_OUT: f32 = 3.0;

/// END 文字停留时长（秒）
const END_LABEL_HOLD: f32 = 2.0;

/// 切换场景前的停顿（秒）
const FINAL_WAIT: f32 = 1.0;

/// 演出期间需要访问的宿主层对象
///
/// 每次调用 [`EndingSequence::tick`] 时由宿主层借出。
pub struct EndingContext<'a> {
    pub player: &'a mut dyn PlayerControl,
    pub dialogue: &'a mut dyn DialogueRunner,
    pub hud: &'a mut dyn HudControls,
    pub screens: &'a mut dyn ScreenLoader,
    pub sound: &'a mut dyn SoundService,
    pub cameras: &'a mut CameraRig,
    pub stage: &'a mut EndingStage,
}

/// 淡变作用的画面元素
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FadeSlot {
    Screen,
    Description,
    EndLabel,
}

impl FadeSlot {
    fn overlay(self, stage: &mut EndingStage) -> &mut Overlay {
        match self {
            Self::Screen => &mut stage.screen,
            Self::Description => &mut stage.description.overlay,
            Self::EndLabel => &mut stage.end_label,
        }
    }
}

/// 轮询等待的对话节点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitNode {
    Ending,
    Description,
}

impl WaitNode {
    fn name(self) -> &'static str {
        match self {
            Self::Ending => ENDING_NODE,
            Self::Description => DESCRIPTION_NODE,
        }
    }
}

/// 当前阶段占用时间的部分
#[derive(Debug, Clone)]
enum Activity {
    /// 瞬时阶段，已完成
    Ready,
    Fade { slot: FadeSlot, fade: Fade },
    Wait { remaining: f32 },
    Poll(WaitNode),
}

/// 结局演出控制器
///
/// 每次触发结局创建一个实例，`Completed` 后由宿主层丢弃。
#[derive(Debug)]
pub struct EndingSequence {
    config: EndingConfig,
    state: SequenceState,
    activity: Activity,
}

impl EndingSequence {
    pub fn new(config: EndingConfig) -> Self {
        Self {
            config,
            state: SequenceState::Idle,
            activity: Activity::Ready,
        }
    }

    /// 开始演出
    ///
    /// 只有第一次调用生效，之后的调用返回 `false` 且不做任何事。
    pub fn trigger(&mut self, ctx: &mut EndingContext<'_>) -> bool {
        if self.state != SequenceState::Idle {
            return false;
        }

        info!("结局演出开始");
        ctx.sound
            .stop_music(self.config.trigger_music_fade_out, false);
        ctx.hud.set_log_view_available(false);
        ctx.hud.set_clue_view_available(false);
        ctx.hud.set_start_dialogue_button_available(false);

        self.state = SequenceState::Running(EndingPhase::LockInput);
        self.activity = self.enter(EndingPhase::LockInput, ctx);
        if self.settle(ctx) {
            self.advance(ctx);
        }
        true
    }

    /// 外部标志变为 true 时触发，然后推进
    ///
    /// 触发所在的 tick 不消耗时间。
    pub fn update(&mut self, ending_flag: bool, dt: f32, ctx: &mut EndingContext<'_>) {
        if self.state == SequenceState::Idle {
            if ending_flag {
                self.trigger(ctx);
            }
            return;
        }
        self.tick(dt, ctx);
    }

    /// 推进 `dt` 秒
    pub fn tick(&mut self, dt: f32, ctx: &mut EndingContext<'_>) {
        if !self.state.is_running() {
            return;
        }

        let done = match &mut self.activity {
            Activity::Ready => true,
            Activity::Fade { slot, fade } => !fade.apply(dt, slot.overlay(ctx.stage)),
            Activity::Wait { remaining } => {
                *remaining -= dt;
                *remaining <= 0.0
            }
            Activity::Poll(node) => poll(*node, &self.config, ctx),
        };

        if done {
            self.advance(ctx);
        }
    }

    pub fn state(&self) -> SequenceState {
        self.state
    }

    pub fn phase(&self) -> Option<EndingPhase> {
        self.state.phase()
    }

    pub fn is_completed(&self) -> bool {
        self.state.is_completed()
    }

    pub fn config(&self) -> &EndingConfig {
        &self.config
    }

    // === 内部方法 ===

    /// 进入后续阶段，直到遇到需要占用时间的阶段或演出结束
    fn advance(&mut self, ctx: &mut EndingContext<'_>) {
        loop {
            let SequenceState::Running(current) = self.state else {
                return;
            };

            let Some(next) = current.next() else {
                info!("结局演出结束");
                self.state = SequenceState::Completed;
                self.activity = Activity::Ready;
                return;
            };

            self.state = SequenceState::Running(next);
            self.activity = self.enter(next, ctx);
            if !self.settle(ctx) {
                return;
            }
        }
    }

    /// 刚进入的阶段能否不消耗时间直接完成
    fn settle(&mut self, ctx: &mut EndingContext<'_>) -> bool {
        match &mut self.activity {
            Activity::Ready => true,
            Activity::Fade { slot, fade } => {
                if fade.duration() <= 0.0 {
                    fade.apply(0.0, slot.overlay(ctx.stage));
                    true
                } else {
                    false
                }
            }
            Activity::Wait { remaining } => *remaining <= 0.0,
            Activity::Poll(node) => poll(*node, &self.config, ctx),
        }
    }

    /// 执行阶段的进入动作
    fn enter(&self, phase: EndingPhase, ctx: &mut EndingContext<'_>) -> Activity {
        debug!(phase = ?phase, "结局演出阶段");
        let fade_time = self.config.fade_time;

        match phase {
            EndingPhase::LockInput => {
                ctx.player.set_can_move(false);
                // 先停用对话系统，之后重新启用时才能干净地开始新节点
                ctx.dialogue.set_active(false);
                Activity::Ready
            }
            EndingPhase::FadeOut => start_fade(FadeSlot::Screen, 0.0, 1.0, fade_time, ctx),
            EndingPhase::CameraSwitch => {
                ctx.cameras.switch_to_overview();
                Activity::Ready
            }
            EndingPhase::PlayMusic => {
                ctx.sound
                    .play_music(&self.config.ending_music, MUSIC_FADE_IN, false);
                Activity::Wait {
                    remaining: MUSIC_LEAD_IN,
                }
            }
            EndingPhase::FadeIn => start_fade(FadeSlot::Screen, 1.0, 0.0, fade_time, ctx),
            EndingPhase::StartEndingDialogue => {
                ctx.dialogue.set_active(true);
                ctx.dialogue.stop();
                ctx.dialogue.start_dialogue(ENDING_NODE);
                Activity::Ready
            }
            EndingPhase::WaitForEndingNode => Activity::Poll(WaitNode::Ending),
            EndingPhase::StartDescriptionDialogue => {
                ctx.dialogue.start_dialogue(DESCRIPTION_NODE);
                Activity::Ready
            }
            EndingPhase::DescriptionFadeIn => {
                start_fade(FadeSlot::Description, 0.0, 1.0, PANEL_FADE, ctx)
            }
            EndingPhase::WaitForDescriptionNode => Activity::Poll(WaitNode::Description),
            EndingPhase::DescriptionFadeOut => {
                ctx.dialogue.set_active(false);
                start_fade(FadeSlot::Description, 1.0, 0.0, PANEL_FADE, ctx)
            }
            EndingPhase::FinalFadeOut => start_fade(FadeSlot::Screen, 0.0, 1.0, fade_time, ctx),
            EndingPhase::ShowEndLabel => start_fade(FadeSlot::EndLabel, 0.0, 1.0, PANEL_FADE, ctx),
            EndingPhase::HoldEndLabel => {
                ctx.sound.stop_music(MUSIC_FADE_OUT, false);
                Activity::Wait {
                    remaining: END_LABEL_HOLD,
                }
            }
            EndingPhase::HideEndLabel => start_fade(FadeSlot::EndLabel, 1.0, 0.0, PANEL_FADE, ctx),
            EndingPhase::FinalWait => Activity::Wait {
                remaining: FINAL_WAIT,
            },
            EndingPhase::LoadNextScreen => {
                info!(screen = NEXT_SCREEN, "切换场景");
                ctx.screens.load_screen(NEXT_SCREEN);
                Activity::Ready
            }
        }
    }
}

fn start_fade(
    slot: FadeSlot,
    from: f32,
    to: f32,
    duration: f32,
    ctx: &mut EndingContext<'_>,
) -> Activity {
    let fade = Fade::new(from, to, duration);
    fade.begin(slot.overlay(ctx.stage));
    Activity::Fade { slot, fade }
}

/// 轮询对话节点，未结束时执行该等待的逐帧动作
fn poll(node: WaitNode, config: &EndingConfig, ctx: &mut EndingContext<'_>) -> bool {
    if ctx.dialogue.has_visited_node(node.name()) {
        return true;
    }
    if node == WaitNode::Description {
        refresh_description(config, ctx);
    }
    false
}

/// 按解说进度变量切换解说图片，找不到图片时保留当前图片
fn refresh_description(config: &EndingConfig, ctx: &mut EndingContext<'_>) {
    let Some(progress) = ctx.dialogue.number_variable(&config.progress_variable) else {
        return;
    };
    let stage = &mut *ctx.stage;
    if !stage.description.show_progress(&stage.atlas, progress) {
        debug!(progress = progress, "找不到对应的解说图片");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::VolumeGroup;
    use crate::fade::FadeTarget;
    use crate::host::{DialogueEvent, ImageHandle};
    use crate::stage::DescriptionAtlas;
    use std::collections::{HashMap, HashSet};

    #[derive(Default)]
    struct Player {
        can_move: Option<bool>,
    }

    impl PlayerControl for Player {
        fn set_can_move(&mut self, can_move: bool) {
            self.can_move = Some(can_move);
        }
    }

    #[derive(Default)]
    struct Hud {
        disabled: usize,
    }

    impl HudControls for Hud {
        fn set_log_view_available(&mut self, available: bool) {
            self.disabled += usize::from(!available);
        }

        fn set_clue_view_available(&mut self, available: bool) {
            self.disabled += usize::from(!available);
        }

        fn set_start_dialogue_button_available(&mut self, available: bool) {
            self.disabled += usize::from(!available);
        }
    }

    #[derive(Default)]
    struct Screens {
        loaded: Vec<String>,
    }

    impl ScreenLoader for Screens {
        fn load_screen(&mut self, name: &str) {
            self.loaded.push(name.to_string());
        }
    }

    #[derive(Default)]
    struct Dialogue {
        active: Option<bool>,
        stops: usize,
        started: Vec<String>,
        visited: HashSet<String>,
        variables: HashMap<String, f32>,
    }

    impl DialogueRunner for Dialogue {
        fn set_active(&mut self, active: bool) {
            self.active = Some(active);
        }

        fn stop(&mut self) {
            self.stops += 1;
        }

        fn start_dialogue(&mut self, node: &str) {
            self.started.push(node.to_string());
        }

        fn has_visited_node(&self, node: &str) -> bool {
            self.visited.contains(node)
        }

        fn number_variable(&self, name: &str) -> Option<f32> {
            self.variables.get(name).copied()
        }

        fn take_events(&mut self) -> Vec<DialogueEvent> {
            Vec::new()
        }
    }

    #[derive(Default)]
    struct Sound {
        music: Vec<(String, f32)>,
        stops: Vec<f32>,
    }

    impl SoundService for Sound {
        fn play_effect(&mut self, _name: &str) {}

        fn play_footstep(&mut self) {}

        fn stop_footstep(&mut self) {}

        fn play_music(&mut self, name: &str, fade_in: f32, _resume: bool) {
            self.music.push((name.to_string(), fade_in));
        }

        fn stop_music(&mut self, fade_out: f32, _pause: bool) {
            self.stops.push(fade_out);
        }

        fn set_volume(&mut self, _group: VolumeGroup, _volume: f32) {}
    }

    struct Fixture {
        player: Player,
        hud: Hud,
        screens: Screens,
        dialogue: Dialogue,
        sound: Sound,
        cameras: CameraRig,
        stage: EndingStage,
    }

    impl Fixture {
        fn new() -> Self {
            let atlas = DescriptionAtlas::new(
                (1..=4)
                    .map(|i| ImageHandle::new(format!("Description{i:02}"), vec![0u8]))
                    .collect(),
            );
            Self {
                player: Player::default(),
                hud: Hud::default(),
                screens: Screens::default(),
                dialogue: Dialogue::default(),
                sound: Sound::default(),
                cameras: CameraRig::default(),
                stage: EndingStage::new(atlas),
            }
        }

        fn ctx(&mut self) -> EndingContext<'_> {
            EndingContext {
                player: &mut self.player,
                dialogue: &mut self.dialogue,
                hud: &mut self.hud,
                screens: &mut self.screens,
                sound: &mut self.sound,
                cameras: &mut self.cameras,
                stage: &mut self.stage,
            }
        }

        fn visit(&mut self, node: &str) {
            self.dialogue.visited.insert(node.to_string());
        }

        /// 推进直到离开当前阶段，返回用掉的 tick 数
        fn run_phase(&mut self, seq: &mut EndingSequence, dt: f32) -> usize {
            let phase = seq.phase();
            let mut ticks = 0;
            while seq.phase() == phase && ticks < 10_000 {
                seq.tick(dt, &mut self.ctx());
                ticks += 1;
            }
            ticks
        }
    }

    #[test]
    fn test_trigger_is_idempotent() {
        let mut fx = Fixture::new();
        let mut seq = EndingSequence::new(EndingConfig::default());

        assert!(seq.trigger(&mut fx.ctx()));
        assert!(!seq.trigger(&mut fx.ctx()));
        assert_eq!(fx.sound.stops, vec![1.0]);
        assert_eq!(fx.hud.disabled, 3);
    }

    #[test]
    fn test_trigger_locks_input_and_starts_fade() {
        let mut fx = Fixture::new();
        let mut seq = EndingSequence::new(EndingConfig::default());
        seq.trigger(&mut fx.ctx());

        assert_eq!(fx.player.can_move, Some(false));
        assert_eq!(fx.dialogue.active, Some(false));
        assert_eq!(seq.phase(), Some(EndingPhase::FadeOut));
        assert!(fx.stage.screen.is_visible());
        assert_eq!(fx.stage.screen.alpha(), 0.0);
    }

    #[test]
    fn test_update_waits_for_flag() {
        let mut fx = Fixture::new();
        let mut seq = EndingSequence::new(EndingConfig::default());

        seq.update(false, 0.1, &mut fx.ctx());
        assert_eq!(seq.state(), SequenceState::Idle);

        seq.update(true, 0.1, &mut fx.ctx());
        assert_eq!(seq.phase(), Some(EndingPhase::FadeOut));
    }

    #[test]
    fn test_camera_switch_and_music_after_fade_out() {
        let mut fx = Fixture::new();
        let mut seq = EndingSequence::new(EndingConfig::default());
        seq.trigger(&mut fx.ctx());

        fx.run_phase(&mut seq, 0.1);
        assert_eq!(fx.stage.screen.alpha(), 1.0);
        assert_eq!(fx.cameras.active().name, "MapOverview");
        assert_eq!(seq.phase(), Some(EndingPhase::PlayMusic));
        assert_eq!(fx.sound.music, vec![("Ending".to_string(), 2.0)]);

        // 固定等待 2 秒
        let ticks = fx.run_phase(&mut seq, 0.1);
        assert!((19..=21).contains(&ticks));
        assert_eq!(seq.phase(), Some(EndingPhase::FadeIn));
    }

    #[test]
    fn test_waits_for_ending_node() {
        let mut fx = Fixture::new();
        let mut seq = EndingSequence::new(EndingConfig::default());
        seq.trigger(&mut fx.ctx());
        for _ in 0..3 {
            fx.run_phase(&mut seq, 0.1);
        }

        assert_eq!(seq.phase(), Some(EndingPhase::WaitForEndingNode));
        assert_eq!(fx.dialogue.active, Some(true));
        assert_eq!(fx.dialogue.stops, 1);
        assert_eq!(fx.dialogue.started, vec!["Ending".to_string()]);

        for _ in 0..50 {
            seq.tick(0.1, &mut fx.ctx());
        }
        assert_eq!(seq.phase(), Some(EndingPhase::WaitForEndingNode));

        fx.visit(ENDING_NODE);
        seq.tick(0.1, &mut fx.ctx());
        assert_eq!(seq.phase(), Some(EndingPhase::DescriptionFadeIn));
        assert_eq!(
            fx.dialogue.started,
            vec!["Ending".to_string(), "Description".to_string()]
        );
        assert!(fx.stage.description.overlay.is_visible());
    }

    #[test]
    fn test_description_image_follows_progress() {
        let mut fx = Fixture::new();
        fx.visit(ENDING_NODE);
        let mut seq = EndingSequence::new(EndingConfig::default());
        seq.trigger(&mut fx.ctx());
        while seq.phase() != Some(EndingPhase::WaitForDescriptionNode) {
            seq.tick(0.1, &mut fx.ctx());
        }

        fx.dialogue
            .variables
            .insert("$DescriptionProgress".to_string(), 2.0);
        seq.tick(0.1, &mut fx.ctx());
        assert_eq!(
            fx.stage.description.image().map(|i| i.name()),
            Some("Description03")
        );

        // 图片不存在时保留上一张
        fx.dialogue
            .variables
            .insert("$DescriptionProgress".to_string(), 9.0);
        seq.tick(0.1, &mut fx.ctx());
        assert_eq!(
            fx.stage.description.image().map(|i| i.name()),
            Some("Description03")
        );

        fx.visit(DESCRIPTION_NODE);
        seq.tick(0.1, &mut fx.ctx());
        assert_eq!(seq.phase(), Some(EndingPhase::DescriptionFadeOut));
        assert_eq!(fx.dialogue.active, Some(false));
    }

    #[test]
    fn test_runs_to_completion() {
        let mut fx = Fixture::new();
        fx.visit(ENDING_NODE);
        fx.visit(DESCRIPTION_NODE);
        let mut seq = EndingSequence::new(EndingConfig::default());
        seq.trigger(&mut fx.ctx());

        let mut ticks = 0;
        while !seq.is_completed() && ticks < 2_000 {
            seq.tick(1.0 / 60.0, &mut fx.ctx());
            ticks += 1;
        }

        assert!(seq.is_completed());
        assert_eq!(fx.screens.loaded, vec![NEXT_SCREEN.to_string()]);
        assert_eq!(fx.sound.stops, vec![1.0, 3.0]);
        assert_eq!(fx.stage.screen.alpha(), 1.0);
        assert_eq!(fx.stage.end_label.alpha(), 0.0);
        assert_eq!(fx.stage.description.overlay.alpha(), 0.0);

        // 完成后不再有任何动作
        seq.tick(1.0, &mut fx.ctx());
        assert!(!seq.trigger(&mut fx.ctx()));
        assert_eq!(fx.screens.loaded.len(), 1);
    }

    #[test]
    fn test_zero_fade_time_does_not_stall() {
        let mut fx = Fixture::new();
        fx.visit(ENDING_NODE);
        fx.visit(DESCRIPTION_NODE);
        let config = EndingConfig {
            fade_time: 0.0,
            ..EndingConfig::default()
        };
        let mut seq = EndingSequence::new(config);
        seq.trigger(&mut fx.ctx());

        // 黑幕淡变瞬时完成，直接进入 BGM 等待
        assert_eq!(seq.phase(), Some(EndingPhase::PlayMusic));
        assert_eq!(fx.stage.screen.alpha(), 1.0);
    }
}
