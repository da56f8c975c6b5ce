use std::fmt::Write;

use crate::archive::Archive;

const UNKNOWN_DATE: &str = "日付不明";
// Scraped posts carry a capture time, never a publish date.
const CAPTURED_LABEL: &str = "投稿";
const SEPARATOR: &str = "---";

/// Render the archive as the Markdown digest uploaded to the analysis tool.
///
/// Output depends only on `archive` (minus `fetched_at`, which is not rendered)
/// and `style_notes`.
pub fn markdown_digest(archive: &Archive, style_notes: Option<&str>) -> String {
    let name = &archive.user_name;
    let style = &archive.writing_style;
    let mut md = String::new();

    // write! into a String cannot fail
    let _ = writeln!(md, "# {}のFacebook投稿アーカイブ\n", name);

    let _ = writeln!(md, "## 概要\n");
    let _ = writeln!(md, "このファイルには{}のFacebook投稿が含まれています。", name);
    let _ = writeln!(
        md,
        "これらの投稿を参考にして、{}さんの文体・口調を真似たコンテンツを生成してください。\n",
        name
    );

    let _ = writeln!(md, "## 文体の特徴\n");
    let _ = writeln!(md, "- **投稿数**: {}件", style.total_posts);
    let _ = writeln!(md, "- **平均文字数**: {}文字", style.average_length);
    let _ = writeln!(md, "- **最大文字数**: {}文字", style.max_length);
    let _ = writeln!(md, "- **よく使う絵文字**: {}", style.top_emojis.join(" "));
    let _ = writeln!(md, "- **よく使う表現**: {}\n", style.expressions.join(", "));

    if let Some(notes) = style_notes.map(str::trim).filter(|n| !n.is_empty()) {
        let _ = writeln!(md, "## {}さんの文体のポイント\n", name);
        let _ = writeln!(md, "{}\n", notes);
    }

    let _ = writeln!(md, "{}\n", SEPARATOR);
    let _ = writeln!(md, "## 投稿一覧\n");

    for (i, post) in archive.posts.iter().enumerate() {
        let label = match (&post.date, &post.captured_at) {
            (Some(date), _) => date.as_str(),
            (None, Some(_)) => CAPTURED_LABEL,
            (None, None) => UNKNOWN_DATE,
        };
        let _ = writeln!(md, "### {}. {}\n", i + 1, label);
        let _ = writeln!(md, "{}\n", post.text);
        let _ = writeln!(md, "{}\n", SEPARATOR);
    }

    md
}
