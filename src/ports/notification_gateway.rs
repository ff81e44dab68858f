use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 通知ゲートウェイポート
///
/// 件名と宛先の一覧を受け取り、配信は実装側に任せる。
/// 実装はSMTP、ログ出力などが考えられる。
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// 延滞通知などを宛先へ送信する
    async fn send(&self, subject: &str, recipients: &[String]) -> Result<()>;
}
