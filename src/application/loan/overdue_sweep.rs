use crate::domain::{self, Loan};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::errors::Result;
use super::loan_service::{ServiceDependencies, find_overdue};

/// 延滞通知の件名（既定値）
pub const DEFAULT_SUBJECT: &str = "Overdue loan: please return the book as soon as possible";

/// 延滞スイープの実行間隔（既定値：1日）
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// 延滞スイープの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepSettings {
    /// この日数を超えて未返却の貸出を延滞とする
    pub threshold_days: u32,
    pub interval: Duration,
    pub subject: String,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            threshold_days: domain::loan::DEFAULT_OVERDUE_DAYS,
            interval: DEFAULT_INTERVAL,
            subject: DEFAULT_SUBJECT.to_string(),
        }
    }
}

/// 1回のスイープの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub threshold: NaiveDate,
    pub overdue_loans: usize,
    pub recipients: Vec<String>,
    /// 通知ゲートウェイへの送信が成功したか
    pub notified: bool,
}

/// 延滞スイープ（1回分）
///
/// 処理フロー：
/// 1. 基準日 = today - threshold_days
/// 2. 基準日より前に貸し出された未返却の貸出を取得
/// 3. 延滞があれば宛先を重複なく集め、通知ゲートウェイを1回だけ呼ぶ
/// 4. 延滞がなければ通知しない
///
/// 状態を持たないため、重複・欠落した起動があっても問題ない。
/// 通知の失敗はログに残すだけで呼び出し元には返さず、貸出も変更しない。
/// 次回のスイープで同じ延滞が再検出される。
///
/// # エラー
/// ストアのエラーのみ（通知ゲートウェイのエラーは含まない）
pub async fn run_overdue_sweep(
    deps: &ServiceDependencies,
    settings: &SweepSettings,
    today: NaiveDate,
) -> Result<SweepReport> {
    let threshold = domain::loan::overdue_threshold(today, settings.threshold_days);

    let overdue = find_overdue(deps, threshold).await?;

    if overdue.is_empty() {
        tracing::debug!(%threshold, "No overdue loans");
        return Ok(SweepReport {
            threshold,
            overdue_loans: 0,
            recipients: Vec::new(),
            notified: false,
        });
    }

    let recipients = collect_recipients(&overdue);

    let notified = match deps
        .notification_gateway
        .send(&settings.subject, &recipients)
        .await
    {
        Ok(()) => {
            tracing::info!(
                overdue_loans = overdue.len(),
                recipients = recipients.len(),
                "Overdue notifications sent"
            );
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, overdue_loans = overdue.len(), "Failed to send overdue notifications");
            false
        }
    };

    Ok(SweepReport {
        threshold,
        overdue_loans: overdue.len(),
        recipients,
        notified,
    })
}

/// 延滞貸出から宛先を重複なく、最初に現れた順で集める
fn collect_recipients(loans: &[Loan]) -> Vec<String> {
    let mut seen = HashSet::new();
    loans
        .iter()
        .map(Loan::contact)
        .filter(|contact| seen.insert(*contact))
        .map(str::to_string)
        .collect()
}

/// 延滞スイープを一定間隔で実行するタスクを起動する
///
/// 最初のスイープは即座に実行される。前回のスイープが終わるまで次は始まらない。
/// `shutdown` に `true` が送られるか送信側が破棄されると終了する。
pub fn spawn_overdue_sweep(
    deps: ServiceDependencies,
    settings: SweepSettings,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let today = chrono::Local::now().date_naive();
                    match run_overdue_sweep(&deps, &settings, today).await {
                        Ok(report) => tracing::info!(
                            threshold = %report.threshold,
                            overdue_loans = report.overdue_loans,
                            notified = report.notified,
                            "Overdue sweep finished"
                        ),
                        Err(e) => tracing::error!(error = %e, "Overdue sweep failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Overdue sweep stopped");
                        break;
                    }
                }
            }
        }
    })
}
