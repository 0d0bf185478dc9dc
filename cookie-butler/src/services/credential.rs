//! Cookie 凭证规整
//!
//! 中继把多个 `Set-Cookie` 用 `, ` 拼接成一个字符串返回,
//! 而 `Expires=Wed, 09 Jun 2025 ...` 自身也含逗号。
//! 这里把原始头拆回独立条目,再压缩为 `name=value;name=value` 形式。

const EXPIRES_ATTR: &str = "expires=";

/// 拆分拼接后的 `Set-Cookie` 头
///
/// 逐字符扫描: 遇到 `expires=` (不区分大小写) 进入过期属性,
/// 遇到下一个 `;` 退出。只有过期属性之外的 `,` 才是条目分隔符。
///
/// # 示例
/// ```
/// use cookie_butler::services::credential::split_cookie_header;
///
/// let entries = split_cookie_header("foo=1; Expires=Wed, 09 Jun 2025 10:18:14 GMT; Path=/, bar=2");
/// assert_eq!(entries, vec!["foo=1; Expires=Wed, 09 Jun 2025 10:18:14 GMT; Path=/", "bar=2"]);
/// ```
pub fn split_cookie_header(raw: &str) -> Vec<String> {
    let chars: Vec<char> = raw.chars().collect();
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_expires = false;

    for (i, &ch) in chars.iter().enumerate() {
        if starts_with_expires(&chars[i..]) {
            in_expires = true;
        }
        if in_expires && ch == ';' {
            in_expires = false;
        }

        if ch == ',' && !in_expires {
            result.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(ch);
        }
    }

    let last = current.trim();
    if !last.is_empty() {
        result.push(last.to_string());
    }

    result
}

fn starts_with_expires(rest: &[char]) -> bool {
    rest.len() >= EXPIRES_ATTR.len()
        && rest
            .iter()
            .zip(EXPIRES_ATTR.chars())
            .all(|(a, b)| a.to_ascii_lowercase() == b)
}

/// 可被压缩的 Cookie 条目集合
///
/// 单个条目 (`&str` / `String`) 与条目序列都可直接传入 [`reduce_cookies`]。
pub trait CookieEntries {
    fn entries(&self) -> Vec<&str>;
}

impl CookieEntries for str {
    fn entries(&self) -> Vec<&str> {
        vec![self]
    }
}

impl CookieEntries for String {
    fn entries(&self) -> Vec<&str> {
        vec![self.as_str()]
    }
}

impl<S: AsRef<str>> CookieEntries for [S] {
    fn entries(&self) -> Vec<&str> {
        self.iter().map(AsRef::as_ref).collect()
    }
}

impl<S: AsRef<str>, const N: usize> CookieEntries for [S; N] {
    fn entries(&self) -> Vec<&str> {
        self.iter().map(AsRef::as_ref).collect()
    }
}

impl<S: AsRef<str>> CookieEntries for Vec<S> {
    fn entries(&self) -> Vec<&str> {
        self.as_slice().entries()
    }
}

/// 压缩 Cookie 条目为请求可用的凭证串
///
/// 每个条目只保留第一个 `"; "` 之前的 `name=value`,丢弃 Path/Expires/HttpOnly 等属性,
/// 空白条目跳过,结果以 `;` 连接。
///
/// # 示例
/// ```
/// use cookie_butler::services::credential::reduce_cookies;
///
/// assert_eq!(reduce_cookies(&["foo=1; Path=/", "bar=2; HttpOnly"]), "foo=1;bar=2");
/// assert_eq!(reduce_cookies("a=b; Path=/"), "a=b");
/// ```
pub fn reduce_cookies<E: CookieEntries + ?Sized>(entries: &E) -> String {
    entries
        .entries()
        .into_iter()
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| {
            let pair = entry.split("; ").next().unwrap_or(entry);
            pair.trim()
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// 合并两段凭证,第二段为空时原样返回第一段
pub fn merge_credentials(first: &str, second: &str) -> String {
    match (first.is_empty(), second.is_empty()) {
        (_, true) => first.to_string(),
        (true, false) => second.to_string(),
        (false, false) => format!("{};{}", first, second),
    }
}

/// 获取凭证中的 Cookie 名 (用于日志,不记录值)
pub fn cookie_names(credential: &str) -> String {
    credential
        .split(';')
        .filter_map(|pair| {
            let name = pair.split('=').next()?.trim();
            (!name.is_empty()).then_some(name)
        })
        .collect::<Vec<_>>()
        .join(", ")
}
