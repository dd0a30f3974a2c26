use markdown_template_config::Locale;

/// Fixed strings the composer falls back to, per locale.
#[derive(Clone, Copy, Debug)]
pub struct LocaleText {
    pub default_title: &'static str,
    pub default_heading: &'static str,
    pub default_image_alt: &'static str,
    pub label_created: &'static str,
    pub label_template: &'static str,
    pub label_title: &'static str,
    pub label_words: &'static str,
    /// Words appended, in order, when a placeholder is expanded.
    pub padding: &'static [&'static str],
    /// Joins consecutive padding words.
    pub separator: &'static str,
}

const ZH: LocaleText = LocaleText {
    default_title: "新文章",
    default_heading: "标题",
    default_image_alt: "图片描述",
    label_created: "生成时间",
    label_template: "模板",
    label_title: "标题",
    label_words: "字数",
    padding: &[
        "这是一个",
        "很好的",
        "补充说明",
        "可以",
        "帮助",
        "读者",
        "更好地",
        "理解",
        "相关内容",
        "通过",
        "这种方式",
        "可以",
        "使",
        "文章",
        "更加",
        "完整",
        "同时",
        "也能够",
        "提供",
        "更多",
        "有用",
        "信息",
        "让",
        "读者",
        "获得",
        "更好的",
        "阅读体验",
    ],
    separator: "",
};

const EN: LocaleText = LocaleText {
    default_title: "New Article",
    default_heading: "Heading",
    default_image_alt: "Image description",
    label_created: "Created",
    label_template: "Template",
    label_title: "Title",
    label_words: "Words",
    padding: &[
        "this", "is", "a", "helpful", "note", "that", "can", "help", "readers", "better",
        "understand", "the", "topic", "and", "in", "this", "way", "the", "article", "becomes",
        "more", "complete", "while", "offering", "useful", "information", "too",
    ],
    separator: " ",
};

pub fn text_for(locale: Locale) -> &'static LocaleText {
    match locale {
        Locale::Zh => &ZH,
        Locale::En => &EN,
    }
}
