//! Built-in hook pattern tables, one catalog per platform.
//!
//! Each pattern fingerprints a library function every game on the platform
//! links in and calls once per frame, which makes its call site a safe place
//! to splice in a hook. The byte sequences were lifted from real retail
//! builds and survive compiler variation either verbatim or, where the SDK
//! code drifts between builds, with wildcard gaps over the unstable words.
//!
//! The tables are data, not logic: built once on first use and immutable for
//! the life of the process.

use std::sync::LazyLock;

use crate::pattern::{Pattern, PatternCatalog, parse_pattern};
use crate::platform::Platform;

struct BuiltinCatalogs {
    ps1: PatternCatalog,
    ps2: PatternCatalog,
    gamecube: PatternCatalog,
    wii: PatternCatalog,
}

static BUILTIN: LazyLock<BuiltinCatalogs> = LazyLock::new(|| BuiltinCatalogs {
    ps1: ps1_catalog(),
    ps2: ps2_catalog(),
    gamecube: gamecube_catalog(),
    wii: wii_catalog(),
});

/// The compiled-in catalog for a platform.
pub fn builtin_catalog(platform: Platform) -> &'static PatternCatalog {
    match platform {
        Platform::Ps1 => &BUILTIN.ps1,
        Platform::Ps2 => &BUILTIN.ps2,
        Platform::Gamecube => &BUILTIN.gamecube,
        Platform::Wii => &BUILTIN.wii,
    }
}

fn hook(name: &str, description: &str, hook_offset: i64, asm: &str, text: &str) -> Pattern {
    let segments = parse_pattern(text).expect("builtin pattern text is well-formed");
    Pattern::new(name, description, hook_offset, asm, segments)
        .expect("builtin patterns are anchored")
}

const PS1_DRAWOTAG_ASM: &str = ".set noreorder\n# Replacing DrawOTag jr ra\nj ModMain\n\n";

fn ps1_catalog() -> PatternCatalog {
    PatternCatalog::new(
        Platform::Ps1,
        vec![
            hook(
                "DrawOTag_v1",
                "DrawOTag (Every Frame Hook) - Variant 1",
                0x14,
                PS1_DRAWOTAG_ASM,
                "09 F8 40 00 21 38 00 00 14 00 BF 8F 10 00 B0 8F 18 00 BD 27 08 00 E0 03 \
                 00 00 00 00 E0 FF BD 27 18 00 B2 AF",
            ),
            hook(
                "DrawOTag_v2",
                "DrawOTag (Every Frame Hook) - Variant 2",
                0x10,
                PS1_DRAWOTAG_ASM,
                "09 F8 40 00 21 38 00 00 14 00 BF 8F 10 00 B0 8F 08 00 E0 03 18 00 BD 27 \
                 E0 FF BD 27 18 00 B2 AF",
            ),
            hook(
                "DrawOTag_v3",
                "DrawOTag (Every Frame Hook) - Variant 3",
                0x18,
                PS1_DRAWOTAG_ASM,
                "00 00 00 00 09 F8 40 00 21 38 00 00 14 00 BF 8F 10 00 B0 8F 18 00 BD 27 \
                 08 00 E0 03 00 00 00 00",
            ),
            hook(
                "DrawOTag_v4",
                "DrawOTag (Every Frame Hook) - Variant 4",
                0x18,
                PS1_DRAWOTAG_ASM,
                "00 00 00 00 09 F8 40 00 21 30 00 00 14 00 BF 8F 10 00 B0 8F 18 00 BD 27 \
                 08 00 E0 03 00 00 00 00",
            ),
        ],
    )
}

fn ps2_catalog() -> PatternCatalog {
    PatternCatalog::new(
        Platform::Ps2,
        vec![
            hook(
                "sceSifSendCmd",
                "sceSifSendCmd (Every Frame Hook)",
                0x28,
                ".set noreorder\n# Replacing sceSifSendCmd jr ra\njal ModMain\n",
                "2D 10 C0 00 2D 18 E0 00 2D 58 00 01 F0 FF BD 27 2D 50 20 01 2D 30 A0 00 \
                 00 00 BF FF 2D 38 40 00 2D 40 60 00 2D 48 60 01",
            )
            .with_original_function("sceSifSendCmd"),
            hook(
                "scePad2Read",
                "scePad2Read (Every Frame Hook)",
                0x48,
                ".set noreorder\n# Replacing scePad2Read jr ra\njal ModMain\n",
                "2D 20 40 02 34 03 03 24 02 00 04 92 18 18 23 02",
            )
            .with_original_function("scePad2Read"),
            hook(
                "scePadRead",
                "scePadRead (Every Frame Hook)",
                0x74,
                ".set noreorder\n# Replacing scePadRead jr ra\njal ModMain\n",
                "2D 38 80 00 70 00 03 24 1C 00 04 24 18 18 E3 70 18 20 A4 00",
            )
            .with_original_function("scePadRead"),
        ],
    )
}

fn gamecube_catalog() -> PatternCatalog {
    PatternCatalog::new(
        Platform::Gamecube,
        vec![
            hook(
                "VIWaitForRetrace",
                "VIWaitForRetrace (Every Frame Hook)",
                -0x10,
                "# Replacing VIWaitForRetrace blr\nb ModMain\n",
                "93 E1 00 44 89 03 00 2C A0 03 00 0E 55 1F 28 34 A1 03 00 16 7C 1F 01 D6 \
                 81 63 00 20 81 43 00 30 A1 83 00 0A 55 08 08 34 7C 08 02 14 7C 0A 02 14 \
                 2C 0B 00 00 90 04 00 00",
            ),
            hook(
                "VISetNextFrameBuffer",
                "VISetNextFrameBuffer (Every Frame Hook). (Cannot Use With Gecko)",
                0x68,
                "# Replacing VISetNextFrameBuffer blr\nb ModMain\n",
                "7C 08 02 A6 3C 80 80 2F 90 01 00 04 94 21 FF E8 93 E1 00 14 3B E4 FA A8 \
                 93 C1 00 10 3B C3 00 00",
            ),
            hook(
                "OSSleepThread",
                "OSSleepThread (Every Frame Hook)",
                0x5C,
                "# Replacing OSSleepThread blr\nb ModMain\n",
                "90 A4 02 E0 80 65 02 E4 90 85 02 E4 28 03 00 00 90 64 02 E4",
            ),
        ],
    )
}

fn wii_catalog() -> PatternCatalog {
    PatternCatalog::new(
        Platform::Wii,
        vec![
            hook(
                "OSSleepThread",
                "OSSleepThread (Every Frame Hook)",
                0x5C,
                "# Replacing OSSleepThread blr\nb ModMain\n",
                "90 A4 02 E0 80 65 02 E4 90 85 02 E4 2C 03 00 00 90 64 02 E4",
            ),
            hook(
                "GXSetDrawDone",
                "GXSetDrawDone (Every Frame Hook)",
                0x4C,
                "# Replacing GXSetDrawDone blr\nb ModMain\n",
                "3B E0 00 00 3C 60 CC 01 93 E3 80 00 93 E3 80 00 93 E3 80 00 93 E3 80 00 \
                 93 E3 80 00 93 E3 80 00 93 E3 80 00 93 E3 80 00 \
                 ?? ?? ?? ?? ?? ?? ?? ?? ?? ?? ?? ?? ?? ?? ?? ?? \
                 80 01 00 14 83 E1 00 0C 83 C1 00 08 7C 08 03 A6 38 21 00 10 4E 80 00 20",
            ),
            hook(
                "GXFlush",
                "GXFlush (Every Frame Hook)",
                0x38,
                "# Replacing GXFlush blr\nb ModMain\n",
                "38 00 00 00 3C 60 CC 01 90 03 80 00 90 03 80 00 90 03 80 00 90 03 80 00 \
                 90 03 80 00 90 03 80 00 90 03 80 00 90 03 80 00 \
                 ?? ?? ?? ?? \
                 80 01 00 14 7C 08 03 A6 38 21 00 10 4E 80 00 20",
            ),
            hook(
                "VIWaitForRetrace",
                "VIWaitForRetrace (Every Frame Hook)",
                0x50,
                "# Replacing VIWaitForRetrace blr\nb ModMain\n",
                "94 21 FF F0 7C 08 02 A6 90 01 00 14 93 E1 00 0C 93 C1 00 08 \
                 ?? ?? ?? ?? 7C 7F 1B 78 \
                 ?? ?? ?? ?? ?? ?? ?? ?? ?? ?? ?? ?? ?? ?? ?? ?? 7C 1E 00 40 \
                 ?? ?? ?? ?? 7F E3 FB 78 ?? ?? ?? ?? \
                 80 01 00 14 83 E1 00 0C 83 C1 00 08 7C 08 03 A6 38 21 00 10 4E 80 00 20",
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_every_platform_has_a_catalog() {
        for platform in Platform::iter() {
            let catalog = builtin_catalog(platform);
            assert_eq!(catalog.platform(), platform);
            assert!(!catalog.is_empty());
        }
    }

    #[test]
    fn test_builtin_names_are_unique_per_catalog() {
        for platform in Platform::iter() {
            let catalog = builtin_catalog(platform);
            for (i, a) in catalog.patterns().iter().enumerate() {
                for b in &catalog.patterns()[i + 1..] {
                    assert_ne!(a.name, b.name, "{platform}");
                }
            }
        }
    }

    #[test]
    fn test_wii_flexible_pattern_spans() {
        let catalog = builtin_catalog(Platform::Wii);
        // 40 literal + 16 gap + 24 literal bytes.
        assert_eq!(catalog.get("GXSetDrawDone").unwrap().matcher().total_len(), 80);
        // 20 + 4 + 4 + 16 + 4 + 4 + 4 + 4 + 24.
        assert_eq!(
            catalog.get("VIWaitForRetrace").unwrap().matcher().total_len(),
            84
        );
    }
}
