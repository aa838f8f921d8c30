//! User-facing strings, localized for the locales the block host offers.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    Ja,
    /// Japanese written in hiragana only.
    JaHira,
}

impl Locale {
    pub const ALL: &[Locale] = &[Locale::En, Locale::Ja, Locale::JaHira];

    /// Resolves a host locale tag; anything unsupported falls back to English.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "ja" => Locale::Ja,
            "ja-Hira" => Locale::JaHira,
            _ => Locale::En,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ja => "ja",
            Locale::JaHira => "ja-Hira",
        }
    }

    /// Shown (and acknowledged) before the landmark model loads.
    pub fn please_wait(self) -> &'static str {
        match self {
            Locale::En => "Setup takes a while. The browser will get stuck, but please wait.",
            Locale::Ja => "準備に時間がかかります。少しの間、操作ができなくなりますがお待ち下さい。",
            Locale::JaHira => {
                "じゅんびにじかんがかかります。すこしのあいだ、そうさができなくなりますがおまちください。"
            }
        }
    }
}
