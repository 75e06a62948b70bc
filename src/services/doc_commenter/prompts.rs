//! 注释生成 Prompt 模板

/// 默认指令模板（C# XML 文档注释）
///
/// 可以通过配置的 `instruction_template` 或 `instruction_template_file` 替换。
pub const DEFAULT_INSTRUCTION_TEMPLATE: &str = r#"You are a code assistant.
Please check the provided code file. If it already contains XML comments for the classes, properties, and fields, do not add or modify any comments. If it is missing comments, add detailed XML comments explaining the purpose and functionality of each class, property, and field. Ensure that the existing comments remain unchanged.
Return only the updated code as raw text. Do not wrap it in Markdown code fences and do not add any explanation."#;

/// 拼接指令模板和文件内容
pub fn format_comment_prompt(template: &str, code: &str) -> String {
    format!("{}\n{}", template.trim_end(), code)
}
