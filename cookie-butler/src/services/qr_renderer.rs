use crate::models::{QrImage, RenderError};

/// 二维码渲染器
///
/// 把二维码内容 (URL或平台给出的码串) 转为可展示的载荷。
/// 图像编码属于外部协作方,适配器只依赖此接口。
pub trait QrRenderer: Send + Sync {
    fn render(&self, content: &str) -> Result<QrImage, RenderError>;
}

/// 文本渲染器
///
/// 不做图像编码,直接把内容作为载荷返回,交由终端或外部工具生成二维码。
#[derive(Debug, Default, Clone, Copy)]
pub struct TextQrRenderer;

impl QrRenderer for TextQrRenderer {
    fn render(&self, content: &str) -> Result<QrImage, RenderError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(RenderError::EmptyContent);
        }
        if content.chars().any(char::is_control) {
            return Err(RenderError::EncodingFailed(
                "内容包含控制字符".to_string(),
            ));
        }
        Ok(QrImage::new(content))
    }
}
