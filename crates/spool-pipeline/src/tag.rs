//! 4문자 코드 태깅
//!
//! 정규화 전 원문에서 설정된 코드 목록을 대소문자 구분 없이 찾습니다.
//! 타임스탬프 내부나 대소문자가 섞인 토큰도 매칭되도록 원문을 사용합니다.

/// 매칭 실패 시 태그 값
pub const NO_TAG: &str = "none";

/// 설정된 코드 순서대로 처음 포함된 코드를 대문자로 반환합니다.
///
/// 코드 목록이 비어 있으면 태깅이 비활성화된 것으로 보고 [`NO_TAG`]를 반환합니다.
pub fn tag(text: &str, codes: &[String]) -> String {
    if codes.is_empty() {
        return NO_TAG.to_owned();
    }

    let haystack = text.to_uppercase();
    codes
        .iter()
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .find(|c| haystack.contains(c.as_str()))
        .unwrap_or_else(|| NO_TAG.to_owned())
}
