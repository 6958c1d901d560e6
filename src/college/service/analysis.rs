// SPDX-License-Identifier: MIT

//! Model-written comparisons between a student's home and a target college

use super::actor;
use crate::adk::model::{complete, GenerationConfig, Model};
use crate::college::entity::{ClimateRecord, College, User};
use crate::college::geo::{strip_segments, GeoService};
use crate::college::store::{climate, colleges, Store};
use crate::error::AppError;
use rusqlite::Connection;
use serde_json::{Map, Value};
use std::sync::Arc;

pub const TRAFFIC_ANALYST_PROMPT: &str = "\
# 你的角色： 路线规划分析师
# 背景:你将收到一份关于高考生与目标院校之间的路线规划文件，请帮助用户分析交通便利度
# 任务要求如下：
- 简要分析每条路线所需的路程，时间，花销成本
- 总结分析两地间的交通便利度，寒暑假往返是否便捷

# 注意：
1. 语言简洁清晰，不说多余的话
2. 使用纯文本回答，不使用代码格式
";

/// Country prefix of the 9-digit region codes climate rows are keyed by
const COUNTRY_PREFIX: &str = "156";

pub const CLIMATE_ANALYST_PROMPT: &str = "\
# 你的角色： 气候差异分析师
# 背景: 高考生正在进行志愿填报，他们将家乡与目标院校所在地的气候差异作为重要标准
# 任务要求如下：
- 简要分析两地的气候差异
- 总结分析两地间的显著差异指标，给出择校建议

# 注意：
1. 语言简洁清晰，不说多余的话
2. 使用纯文本回答，不使用代码格式
";

#[derive(Clone)]
pub struct AnalysisService {
    store: Store,
    geo: Arc<dyn GeoService>,
    model: Arc<dyn Model>,
    config: GenerationConfig,
}

impl AnalysisService {
    pub fn new(
        store: Store,
        geo: Arc<dyn GeoService>,
        model: Arc<dyn Model>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            store,
            geo,
            model,
            config,
        }
    }

    async fn user_and_college(
        &self,
        actor_id: i64,
        college_id: i64,
    ) -> Result<(User, College), AppError> {
        self.store
            .call(move |conn| {
                let user = actor(conn, actor_id)?;
                let college = colleges::get(conn, college_id)?
                    .ok_or_else(|| AppError::not_found("college not found"))?;
                Ok((user, college))
            })
            .await
    }

    /// Plan a transit route from the user's home to the college and let the
    /// model judge how convenient the trip is.
    pub async fn traffic(&self, actor_id: i64, college_id: i64) -> Result<String, AppError> {
        let (user, college) = self.user_and_college(actor_id, college_id).await?;
        let destination = college
            .info
            .location()
            .ok_or_else(|| AppError::validation("college has no coordinates"))?;

        let mut route = self
            .geo
            .transit_route(
                &user.location,
                &destination,
                &user.city,
                college.info.city.as_deref(),
            )
            .await?;
        strip_segments(&mut route);

        let route = serde_json::to_string(&route)?;
        log::debug!(
            "traffic analysis for user {} -> college {}",
            actor_id,
            college_id
        );
        let model = self.model.as_ref();
        complete(model, TRAFFIC_ANALYST_PROMPT, &route, Some(&self.config)).await
    }

    /// Compare the climate at home with the climate at the college
    pub async fn climate(&self, actor_id: i64, college_id: i64) -> Result<String, AppError> {
        let (user, college) = self.user_and_college(actor_id, college_id).await?;

        let home_codes = region_codes(&user.adcode.to_string());
        let college_codes = college
            .info
            .admin_code
            .as_deref()
            .map(region_codes)
            .unwrap_or_default();
        let (home, away) = self
            .store
            .call(move |conn| {
                let home = first_climate(conn, &home_codes)?;
                let away = first_climate(conn, &college_codes)?;
                Ok((home, away))
            })
            .await?;

        let prompt = climate_prompt(&user, &college, home.as_ref(), away.as_ref());
        let model = self.model.as_ref();
        complete(model, CLIMATE_ANALYST_PROMPT, &prompt, Some(&self.config)).await
    }
}

/// Climate keys to try for a region, most specific first.
///
/// Users carry 6-digit AMap adcodes while climate rows are keyed by 9-digit
/// codes with the `156` country prefix. A district with no climate row falls
/// back to its prefecture and then its province.
fn region_codes(code: &str) -> Vec<String> {
    let digits = match code.strip_prefix(COUNTRY_PREFIX) {
        Some(rest) if rest.len() == 6 => rest,
        _ => code,
    };
    let adcode = match digits.parse::<u32>() {
        Ok(adcode) if digits.len() == 6 => adcode,
        _ => return vec![code.to_string()],
    };

    let mut codes = Vec::new();
    for level in [adcode, adcode / 100 * 100, adcode / 10_000 * 10_000] {
        let prefixed = format!("{}{:06}", COUNTRY_PREFIX, level);
        for candidate in [prefixed, level.to_string()] {
            if !codes.contains(&candidate) {
                codes.push(candidate);
            }
        }
    }
    codes
}

fn first_climate(conn: &Connection, codes: &[String]) -> Result<Option<ClimateRecord>, AppError> {
    for code in codes {
        if let Some(record) = climate::get(conn, code)? {
            return Ok(Some(record));
        }
    }
    Ok(None)
}

/// Non-null monthly values as a JSON object
fn climate_json(record: &ClimateRecord) -> String {
    let values: Map<String, Value> = record
        .values
        .iter()
        .filter_map(|(k, v)| v.map(|v| (k.clone(), Value::from(v))))
        .collect();
    Value::Object(values).to_string()
}

fn climate_prompt(
    user: &User,
    college: &College,
    home: Option<&ClimateRecord>,
    away: Option<&ClimateRecord>,
) -> String {
    let mut prompt = format!(
        "我是{}省的高考生，我想去{}省的{}大学，请帮我比较两地的气候差异，并给出比较结果。",
        user.province, college.info.province, college.info.name
    );
    if let Some(home) = home {
        let data = climate_json(home);
        let code = &home.admin_code;
        prompt.push_str(&format!("\n家乡（{}）月度气候数据：{}", code, data));
    }
    if let Some(away) = away {
        let data = climate_json(away);
        let code = &away.admin_code;
        prompt.push_str(&format!("\n院校所在地（{}）月度气候数据：{}", code, data));
    }
    prompt
}
