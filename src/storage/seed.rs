/// Starter library for a fresh database

use tracing::info;

use crate::domain::{DhikrCategory, NewDhikr};
use crate::storage::{DhikrRepository, RecordStore, SettingsRepository, StorageError};

const SOURCE: &str = "الكافي";

/// (name, text, category, repetitions, priority, favorite, reward)
const STARTER_DHIKR: [(&str, &str, DhikrCategory, u32, i32, bool, &str); 6] = [
    (
        "سبحان الله",
        "سُبْحَانَ اللَّهِ",
        DhikrCategory::Tasbih,
        33,
        1,
        false,
        "من قالها مائة مرة غفرت خطاياه وإن كانت مثل زبد البحر",
    ),
    ("الحمد لله", "الْحَمْدُ لِلَّهِ", DhikrCategory::Tasbih, 33, 2, false, "تملأ الميزان"),
    ("الله أكبر", "اللَّهُ أَكْبَرُ", DhikrCategory::Tasbih, 34, 3, false, "خير من الدنيا وما فيها"),
    ("لا إله إلا الله", "لَا إِلَٰهَ إِلَّا اللَّهُ", DhikrCategory::General, 100, 4, true, "أفضل الذكر"),
    (
        "أستغفر الله",
        "أَسْتَغْفِرُ اللَّهَ",
        DhikrCategory::General,
        100,
        5,
        false,
        "من لزم الاستغفار جعل الله له من كل هم فرجا",
    ),
    (
        "آية الكرسي",
        "اللَّهُ لَا إِلَٰهَ إِلَّا هُوَ الْحَيُّ الْقَيُّومُ",
        DhikrCategory::Quran,
        1,
        6,
        true,
        "من قرأها في ليلة لم يزل عليه من الله حافظ",
    ),
];

/// Insert the starter dhikr and the settings record when the library is empty.
///
/// Returns whether anything was seeded. The whole seed is one atomic batch.
pub fn seed_if_empty<S: RecordStore>(storage: &S) -> Result<bool, StorageError> {
    if !storage.list_dhikr(None, Some(1))?.is_empty() {
        info!("Database already seeded");
        return Ok(false);
    }

    storage.atomically(|s| {
        for (name, text, category, repetitions, priority, favorite, reward) in STARTER_DHIKR {
            s.create_dhikr(&NewDhikr {
                name: Some(name.to_string()),
                arabic_text: text.to_string(),
                category: Some(category),
                repetitions: Some(repetitions),
                reward: Some(reward.to_string()),
                source: Some(SOURCE.to_string()),
                priority: Some(priority),
                is_active: Some(true),
                is_favorite: Some(favorite),
            })?;
        }
        s.get_or_create_settings()?;
        Ok::<(), StorageError>(())
    })?;

    info!("Seeded database with {} starter dhikr", STARTER_DHIKR.len());
    Ok(true)
}
