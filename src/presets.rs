//! Preset prompts the user can send with one tap.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::error::{MentorError, MentorResult};
use crate::models::ChatOptions;
use crate::state::{SendOutcome, Session, SessionController};
use crate::traits::{ConfigProvider, HttpClient};

/// Presets shown together in the carousel.
pub const PAGE_SIZE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetGroup {
    pub label: &'static str,
    pub icon: &'static str,
    pub items: &'static [&'static str],
}

pub const PRESET_GROUPS: [PresetGroup; 4] = [
    PresetGroup {
        label: "舒缓与放松",
        icon: "🌿",
        items: &["我今天有些焦虑，能帮我放松吗？", "帮我做一次3分钟呼吸练习"],
    },
    PresetGroup {
        label: "认知重构",
        icon: "🧠",
        items: &["帮我用认知重构看待今天的困扰", "我在某件事上总是负面思考，怎么办？"],
    },
    PresetGroup {
        label: "睡眠与作息",
        icon: "🌙",
        items: &["我最近睡前很难放松，有什么建议？", "我想改善入睡前的焦虑"],
    },
    PresetGroup {
        label: "工作与压力",
        icon: "💼",
        items: &["我对工作感到压力大，如何缓解？", "我担心今天的任务做不好，怎么办？"],
    },
];

/// Every preset, group by group.
pub fn all_presets() -> Vec<&'static str> {
    PRESET_GROUPS
        .iter()
        .flat_map(|group| group.items.iter().copied())
        .collect()
}

/// Pages through [`all_presets`] two at a time, wrapping at the end.
#[derive(Debug, Clone)]
pub struct PresetCarousel {
    items: Vec<&'static str>,
    page: usize,
}

impl Default for PresetCarousel {
    fn default() -> Self {
        Self::new(all_presets())
    }
}

impl PresetCarousel {
    pub fn new(items: Vec<&'static str>) -> Self {
        Self { items, page: 0 }
    }

    /// Presets on the current page. Shorter than a full page only when the
    /// page runs past the end of the list.
    pub fn current(&self) -> &[&'static str] {
        if self.items.is_empty() {
            return &[];
        }
        let start = (self.page * PAGE_SIZE) % self.items.len();
        let end = (start + PAGE_SIZE).min(self.items.len());
        &self.items[start..end]
    }

    /// Move to the next page and return it.
    pub fn shuffle(&mut self) -> &[&'static str] {
        let pages = self.items.len().div_ceil(PAGE_SIZE).max(1);
        self.page = (self.page + 1) % pages;
        self.current()
    }

    pub fn page(&self) -> usize {
        self.page
    }
}

/// Sends presets through the session controller.
///
/// A preset is an ordinary send: it is refused while another reply is in
/// flight and can be cancelled the same way.
pub struct PresetDispatcher<H, C> {
    controller: Arc<SessionController<H, C>>,
}

impl<H: HttpClient, C: ConfigProvider> PresetDispatcher<H, C> {
    pub fn new(controller: Arc<SessionController<H, C>>) -> Self {
        Self { controller }
    }

    pub async fn dispatch(
        &self,
        session: &Session,
        preset_text: &str,
        options: ChatOptions,
    ) -> MentorResult<SendOutcome> {
        self.controller.send(session, preset_text, options).await
    }

    /// Send the `index`-th preset of the carousel's current page.
    pub async fn dispatch_item(
        &self,
        session: &Session,
        carousel: &PresetCarousel,
        index: usize,
        options: ChatOptions,
    ) -> Option<MentorResult<SendOutcome>> {
        let text = *carousel.current().get(index)?;
        Some(self.dispatch(session, text, options).await)
    }
}

impl<H, C> PresetDispatcher<H, C>
where
    H: HttpClient + 'static,
    C: ConfigProvider + 'static,
{
    /// Run [`dispatch_item`](Self::dispatch_item) on its own task.
    ///
    /// Returns `None`, spawning nothing, when the page has no such preset.
    pub fn spawn_item(
        self: &Arc<Self>,
        session: Session,
        carousel: &PresetCarousel,
        index: usize,
        options: ChatOptions,
    ) -> Option<JoinHandle<MentorResult<SendOutcome>>> {
        carousel.current().get(index)?;
        let dispatcher = Arc::clone(self);
        let carousel = carousel.clone();
        Some(tokio::spawn(async move {
            dispatcher
                .dispatch_item(&session, &carousel, index, options)
                .await
                .unwrap_or_else(|| {
                    Err(MentorError::Client {
                        message: format!("no preset {} on this page", index + 1),
                    })
                })
        }))
    }
}
