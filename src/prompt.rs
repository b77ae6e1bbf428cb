//! System prompts for the mentor.
//!
//! The system prompt is rebuilt on every send from the latest mood
//! statistics, so it always reflects what the user has recorded.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

/// The mentor persona: tone, safety rules, and reply structure.
pub const PERSONA_PROMPT: &str = "\
角色：温暖、稳重的 AI 伴侣。你的目标是在当下帮助用户缓解情绪、获得清晰，并形成可持续的自助练习与反思。

原则：
- 使用中文、短句、友善且不评判；先共情再给建议。
- 不进行医疗诊断或治疗承诺；不讨论药物或替代专业治疗。
- 若出现自伤/他伤/严重危机信号，温柔提醒联系当地紧急热线或可信任的人，并建议立即寻求线下帮助。

回应结构（按序）：
1) 共情与归纳：用 1–2 句准确复述用户的核心感受/困扰。
2) 微建议或练习：从“呼吸练习”“正念冥想”“5-4-3-2-1锚定练习”“认知重构”中挑选最贴切的 1 项，给出 2–5 步的简明操作与预计时长（如 3 分钟）。可提示“点击下方按钮开始”。
3) 追问：提出一个具体的小问题，帮助澄清诱因、需求或边界。
4) 可保存要点：给出 1–3 条可记录到日记的关键词或句子。

风格与限制：
- 每次回复控制在 120–220 字；问题复杂时分段逐步推进。
- 避免夸大或不确定断言；不确定就诚实说明并给出可行替代。
- 不索取或存储敏感个人信息；尊重用户节奏与文化背景。";

/// Placeholder for reframe fields the user left blank.
const NOT_PROVIDED: &str = "（未提供）";

/// Summary of recent mood records fed into the system prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodStats {
    /// Average intensity over the last 7 days
    pub avg_7d: f32,
    /// Most frequent mood label
    pub most_mood: String,
    /// Records made today
    pub today_count: u32,
}

impl Default for MoodStats {
    fn default() -> Self {
        Self {
            avg_7d: 5.0,
            most_mood: "平静".to_string(),
            today_count: 1,
        }
    }
}

/// Guidance rules plus a line of reference data from `stats`.
pub fn build_mentor_system_prompt(stats: &MoodStats) -> String {
    [
        "你是一位温暖、稳重的 AI 伴侣。".to_string(),
        "请遵循：".to_string(),
        "1) 不提供医疗诊断或治疗承诺；使用一般性健康建议。".to_string(),
        "2) 优先给出可执行的短练习（呼吸、正念、认知重构、grounding）。".to_string(),
        "3) 用分段输出（每段≤3行），适合移动端阅读。".to_string(),
        "4) 保持共情、尊重与不评判。".to_string(),
        "5) 若出现危机或自伤他伤风险，提醒联系当地紧急热线。".to_string(),
        String::new(),
        format!(
            "参考数据：近7天平均强度={}，高频情绪={}，今日记录数={}。",
            stats.avg_7d, stats.most_mood, stats.today_count
        ),
        "在回答中结合这些信息，给出具体、温和、分点的建议。".to_string(),
    ]
    .join("\n")
}

/// Inputs of the cognitive reframing exercise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReframeInput {
    pub scene: Option<String>,
    pub automatic_thought: Option<String>,
    pub evidence_for: Option<String>,
    pub evidence_against: Option<String>,
}

fn or_not_provided(field: &Option<String>) -> &str {
    field
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_PROVIDED)
}

/// Prompt asking for a more balanced alternative statement.
pub fn build_reframe_prompt(input: &ReframeInput) -> String {
    [
        "你是一位认知疗法风格的导师。请基于下述信息，生成“更平衡的替代陈述”草案，语气温和，避免医疗宣称。".to_string(),
        "输出要求：".to_string(),
        "1) 先简短共情；".to_string(),
        "2) 给出1-2条更客观的替代陈述；".to_string(),
        "3) 最后提供一个可执行的小练习（例如记录证据、呼吸或grounding）；".to_string(),
        String::new(),
        format!("场景：{}", or_not_provided(&input.scene)),
        format!("自动化想法：{}", or_not_provided(&input.automatic_thought)),
        format!("支持证据：{}", or_not_provided(&input.evidence_for)),
        format!("反对证据：{}", or_not_provided(&input.evidence_against)),
    ]
    .join("\n")
}

/// Produces the system prompt for one send.
pub trait SystemPromptBuilder: Send + Sync {
    fn build(&self) -> String;
}

impl<F> SystemPromptBuilder for F
where
    F: Fn() -> String + Send + Sync,
{
    fn build(&self) -> String {
        self()
    }
}

/// Persona followed by the mentor rules over the latest stats snapshot.
///
/// Clones share the snapshot, so stats updated elsewhere are picked up by
/// the next send.
#[derive(Debug, Clone, Default)]
pub struct MoodPromptBuilder {
    stats: Arc<RwLock<MoodStats>>,
}

impl MoodPromptBuilder {
    pub fn new(stats: MoodStats) -> Self {
        Self {
            stats: Arc::new(RwLock::new(stats)),
        }
    }

    pub fn update(&self, stats: MoodStats) {
        *self.stats.write().unwrap_or_else(PoisonError::into_inner) = stats;
    }

    pub fn stats(&self) -> MoodStats {
        self.stats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SystemPromptBuilder for MoodPromptBuilder {
    fn build(&self) -> String {
        format!(
            "{}\n\n{}",
            PERSONA_PROMPT,
            build_mentor_system_prompt(&self.stats())
        )
    }
}
