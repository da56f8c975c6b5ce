const MIN_POST_CHARS: usize = 30;
const STATUS_UPDATE_MARKER: &str = "に更新";
const STATUS_UPDATE_MAX: usize = 50;
const URL_ONLY_MAX: usize = 100;
const PLACE_PREFIX: &str = "場所:";
const PLACE_MAX: usize = 100;

/// Rejects export boilerplate: profile-update notices, bare links, check-ins
/// and activity lines about the account owner.
#[derive(Debug, Clone, Default)]
pub struct NoiseFilter {
    activity_phrase: Option<String>,
}

impl NoiseFilter {
    /// `actor` is the owner's name as the export writes it, e.g. "山田 太郎".
    pub fn new(actor: Option<&str>) -> Self {
        Self {
            activity_phrase: actor
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(|a| format!("{}さんが", a)),
        }
    }

    pub fn is_meaningful(&self, text: &str) -> bool {
        let len = text.chars().count();
        if len < MIN_POST_CHARS {
            return false;
        }
        if text.contains(STATUS_UPDATE_MARKER) && len < STATUS_UPDATE_MAX {
            return false;
        }
        if text.starts_with("http") && len < URL_ONLY_MAX {
            return false;
        }
        if let Some(phrase) = &self.activity_phrase {
            if text.contains(phrase.as_str()) {
                return false;
            }
        }
        if text.starts_with(PLACE_PREFIX) && len < PLACE_MAX {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "今日は子どもたちと一緒にプログラミング教室を開きました。みんな真剣でした！";

    #[test]
    fn accepts_ordinary_post() {
        assert!(NoiseFilter::default().is_meaningful(BODY));
    }

    #[test]
    fn rejects_short() {
        let f = NoiseFilter::default();
        assert!(!f.is_meaningful(""));
        assert!(!f.is_meaningful("短い投稿"));
        // 29 characters
        assert!(!f.is_meaningful(&"あ".repeat(29)));
        assert!(f.is_meaningful(&"あ".repeat(30)));
    }

    #[test]
    fn rejects_profile_updates_only_when_short() {
        let f = NoiseFilter::default();
        let update = "山田太郎さんがプロフィール写真を新しい写真に更新しました。よろしくね";
        assert!(update.chars().count() < 50);
        assert!(!f.is_meaningful(update));

        let long = format!("{}{}", "カバー写真に更新しました。", BODY);
        assert!(long.chars().count() >= 50);
        assert!(f.is_meaningful(&long));
    }

    #[test]
    fn rejects_bare_links() {
        let f = NoiseFilter::default();
        assert!(!f.is_meaningful("https://example.com/articles/2025/01/some-long-slug-here"));
        let long = format!("https://example.com/{}", "a".repeat(100));
        assert!(f.is_meaningful(&long));
    }

    #[test]
    fn rejects_check_ins() {
        let f = NoiseFilter::default();
        assert!(!f.is_meaningful("場所: 東京都渋谷区神南一丁目のカフェ・レストラン・スタジオで打ち合わせ"));
    }

    #[test]
    fn activity_lines_need_actor() {
        let line = "山田 太郎さんが写真を共有しました。山田 太郎さんがイベントに参加しました。";
        assert!(NoiseFilter::default().is_meaningful(line));
        assert!(!NoiseFilter::new(Some("山田 太郎")).is_meaningful(line));
        assert!(NoiseFilter::new(Some("  ")).is_meaningful(line));
    }
}
