//! Answer pipeline: provider abstraction + knowledge-base short circuit.
//!
//! Questions run through two cheap keyword gates (off-topic, investment
//! advice) before touching the knowledge base or the upstream model. A
//! knowledge-base hit returns the stored answer and bumps its access
//! metadata; a miss asks the configured provider and persists the result.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::ingest::types::Lang;
use crate::knowledge::KnowledgeBase;

// ------------------------------------------------------------
// Provider abstraction
// ------------------------------------------------------------

/// Upstream answer producer. A failure here surfaces to the caller; nothing
/// is persisted on the failure path.
pub trait AnswerClient: Send + Sync {
    fn answer<'a>(
        &'a self,
        question: &'a str,
        lang: Lang,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
    fn provider_name(&self) -> &'static str;
}

pub type DynAnswerClient = Arc<dyn AnswerClient>;

/// Factory honoring the same env switches the rest of the app uses:
/// `AI_TEST_MODE=mock` forces the deterministic mock; a missing
/// `DEEPSEEK_API_KEY` yields the disabled client.
pub fn build_answer_client() -> DynAnswerClient {
    if std::env::var("AI_TEST_MODE").map(|v| v == "mock").unwrap_or(false) {
        return Arc::new(MockClient {
            fixed: "Mock answer.".to_string(),
        });
    }
    let api_key = std::env::var("DEEPSEEK_API_KEY").unwrap_or_default();
    if api_key.is_empty() {
        return Arc::new(DisabledClient);
    }
    Arc::new(DeepSeekClient::new(api_key, None))
}

/// DeepSeek chat-completions provider. Knowledge questions only; the system
/// prompt forbids investment advice in both languages.
pub struct DeepSeekClient {
    http: reqwest::Client,
    api_key: String,
    url: String,
    model: String,
}

impl DeepSeekClient {
    pub fn new(api_key: String, model_override: Option<&str>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("crypto-news-core/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        let url = std::env::var("DEEPSEEK_API_URL")
            .unwrap_or_else(|_| "https://api.deepseek.com/chat/completions".to_string());
        Self {
            http,
            api_key,
            url,
            model: model_override.unwrap_or("deepseek-chat").to_string(),
        }
    }

    fn system_prompt(lang: Lang) -> &'static str {
        match lang {
            Lang::Zh => {
                "你是一个币圈知识助手，只回答加密货币和区块链的知识性问题。\
                 禁止提供任何投资建议、币种推荐、价格预测或买卖时机指导。\
                 只陈述客观事实，涉及风险时客观提示，回答简洁、专业。"
            }
            Lang::En => {
                "You are a crypto knowledge assistant. Answer only knowledge questions \
                 about cryptocurrency and blockchain. Never give investment advice, coin \
                 recommendations, price predictions, or trade timing. State objective \
                 facts, note risks neutrally, keep answers concise and professional."
            }
        }
    }
}

impl AnswerClient for DeepSeekClient {
    fn answer<'a>(
        &'a self,
        question: &'a str,
        lang: Lang,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            #[derive(Serialize)]
            struct Msg<'a> {
                role: &'a str,
                content: &'a str,
            }
            #[derive(Serialize)]
            struct Req<'a> {
                model: &'a str,
                messages: Vec<Msg<'a>>,
                temperature: f32,
                max_tokens: u32,
            }
            #[derive(Deserialize)]
            struct Resp {
                choices: Vec<Choice>,
            }
            #[derive(Deserialize)]
            struct Choice {
                message: ChoiceMsg,
            }
            #[derive(Deserialize)]
            struct ChoiceMsg {
                content: String,
            }

            let req = Req {
                model: &self.model,
                messages: vec![
                    Msg {
                        role: "system",
                        content: Self::system_prompt(lang),
                    },
                    Msg {
                        role: "user",
                        content: question,
                    },
                ],
                temperature: 0.3,
                max_tokens: 800,
            };

            let resp = self
                .http
                .post(&self.url)
                .bearer_auth(&self.api_key)
                .json(&req)
                .send()
                .await
                .context("deepseek request")?;

            if !resp.status().is_success() {
                bail!("deepseek returned {}", resp.status());
            }
            let body: Resp = resp.json().await.context("deepseek response body")?;
            let content = body
                .choices
                .first()
                .map(|c| c.message.content.trim())
                .unwrap_or_default();
            if content.is_empty() {
                bail!("deepseek returned an empty answer");
            }
            Ok(content.to_string())
        })
    }

    fn provider_name(&self) -> &'static str {
        "deepseek"
    }
}

/// Always fails; used when no API key is configured.
pub struct DisabledClient;

impl AnswerClient for DisabledClient {
    fn answer<'a>(
        &'a self,
        _question: &'a str,
        _lang: Lang,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async { Err(anyhow!("answer provider disabled")) })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic client for tests/local runs.
#[derive(Clone)]
pub struct MockClient {
    pub fixed: String,
}

impl AnswerClient for MockClient {
    fn answer<'a>(
        &'a self,
        _question: &'a str,
        _lang: Lang,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        let out = self.fixed.clone();
        Box::pin(async move { Ok(out) })
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

// ------------------------------------------------------------
// Topic gates
// ------------------------------------------------------------

const CRYPTO_KEYWORDS: &[&str] = &[
    "bitcoin", "btc", "ethereum", "eth", "blockchain", "cryptocurrency", "crypto", "token",
    "wallet", "private key", "seed phrase", "mining", "miner", "hash rate", "consensus", "pow",
    "pos", "proof of stake", "proof of work", "staking", "validator", "smart contract", "defi",
    "nft", "dao", "layer2", "rollup", "exchange", "binance",
    "coinbase", "fork", "bridge", "oracle", "solana", "sol", "polkadot", "cardano", "xrp", "doge",
    "stablecoin", "whitepaper", "tokenomics", "halving", "regulation", "sec", "比特币", "以太坊",
    "区块链", "加密货币", "数字货币", "代币", "钱包", "私钥", "助记词", "挖矿", "矿工", "共识",
    "智能合约", "交易所", "分叉", "跨链", "预言机", "监管", "白皮书", "减半",
];

const INVESTMENT_KEYWORDS: &[&str] = &[
    "should i buy", "should i sell", "when to buy", "when to sell", "price prediction",
    "price target", "will it pump", "will it moon", "is it a good investment", "which coin",
    "how much profit", "all in", "leverage", "long or short", "stop loss", "take profit",
    "买哪个", "该买", "值得买", "能买吗", "该卖", "卖哪个", "投资建议", "投资策略", "仓位",
    "加仓", "减仓", "止损", "止盈", "抄底", "逃顶", "会涨吗", "会跌吗", "目标价", "梭哈",
    "杠杆", "做多", "做空", "百倍币", "什么时候买", "什么时候卖", "推荐币种", "买什么币",
];

/// True when the question mentions any crypto-domain keyword.
pub fn is_crypto_related(question: &str) -> bool {
    let q = question.to_lowercase();
    CRYPTO_KEYWORDS.iter().any(|k| q.contains(k))
}

/// True when the question asks for trading or investment guidance.
pub fn is_investment_advice(question: &str) -> bool {
    let q = question.to_lowercase();
    INVESTMENT_KEYWORDS.iter().any(|k| q.contains(k))
}

pub fn off_topic_text(lang: Lang) -> &'static str {
    match lang {
        Lang::Zh => "抱歉，我只能回答币圈（加密货币、区块链）相关的问题。",
        Lang::En => {
            "Sorry, I can only answer questions related to cryptocurrency and blockchain."
        }
    }
}

pub fn refusal_text(lang: Lang) -> &'static str {
    match lang {
        Lang::Zh => "抱歉，我只提供币圈知识和信息，不提供任何投资建议或炒币指导。",
        Lang::En => {
            "Sorry, I can only provide crypto knowledge and information, not investment \
             advice or trading guidance."
        }
    }
}

// ------------------------------------------------------------
// Knowledge service
// ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AskOutcome {
    pub answer: String,
    pub from_cache: bool,
    /// True when a topic gate produced the answer without any lookup or call.
    pub filtered: bool,
}

pub struct KnowledgeService {
    kb: Arc<KnowledgeBase>,
    client: DynAnswerClient,
    threshold: f64,
}

impl KnowledgeService {
    pub fn new(kb: Arc<KnowledgeBase>, client: DynAnswerClient, threshold: f64) -> Self {
        Self {
            kb,
            client,
            threshold,
        }
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    /// Gate, then knowledge-base lookup, then the upstream provider. Provider
    /// failure surfaces as `Err` and persists nothing.
    pub async fn ask(&self, question: &str, lang: Lang) -> Result<AskOutcome> {
        if !is_crypto_related(question) {
            return Ok(AskOutcome {
                answer: off_topic_text(lang).to_string(),
                from_cache: false,
                filtered: true,
            });
        }
        if is_investment_advice(question) {
            return Ok(AskOutcome {
                answer: refusal_text(lang).to_string(),
                from_cache: false,
                filtered: true,
            });
        }

        if let Some(hit) = self.kb.lookup(question, self.threshold) {
            tracing::debug!(id = %hit.id, access_count = hit.access_count, "knowledge hit");
            return Ok(AskOutcome {
                answer: hit.answer,
                from_cache: true,
                filtered: false,
            });
        }

        let answer = self
            .client
            .answer(question, lang)
            .await
            .with_context(|| format!("provider {} failed", self.client.provider_name()))?;
        self.kb.append(question, &answer, lang);
        Ok(AskOutcome {
            answer,
            from_cache: false,
            filtered: false,
        })
    }
}
